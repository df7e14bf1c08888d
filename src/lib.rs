//! Tally - shared expense splitting and settlement
//!
//! Members of a group record what they paid for; Tally splits each expense
//! (equally, by percentage or by fixed amounts), keeps a net balance per
//! member and suggests a short list of transfers that settles everyone up.
//!
//! # Architecture
//!
//! - `engine`: pure split, balance and settlement algorithms
//! - `models`: groups, members, expenses, money and percentages
//! - `storage`: JSON file storage layer
//! - `services`: business logic on top of storage and the engine
//! - `audit`: audit log of every data change
//! - `config`: paths and user settings
//! - `cli` / `display` / `export`: the command-line surface
//!
//! # Example
//!
//! ```rust
//! use tally::engine::{compute_balances, normalize, plan, SplitShares};
//! use tally::models::{Expense, GroupId, MemberId, Money, SplitMethod};
//!
//! let (ann, bob, cat) = (MemberId::new(), MemberId::new(), MemberId::new());
//! let roster = [ann, bob, cat];
//! let amount = Money::from_cents(9000);
//!
//! let splits = normalize(amount, &roster, &SplitShares::equal_all()).unwrap();
//! let expense = Expense::new(GroupId::new(), ann, amount, "Dinner", SplitMethod::Equal, splits);
//!
//! let balances = compute_balances(&roster, [&expense]).unwrap();
//! assert_eq!(balances.get(ann), Money::from_cents(6000));
//!
//! let transfers = plan(&balances).unwrap();
//! assert_eq!(transfers.len(), 2);
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::TallyError;
