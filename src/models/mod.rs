//! Wire types exchanged with the prediction API.
//!
//! The client never owns persistence of any of these; they are snapshots
//! of what the backend sends or expects.

pub mod account;
pub mod comorbidity;
pub mod feedback;
pub mod history;
pub mod medication;
pub mod metrics;
pub mod patient;
pub mod prediction;

pub use account::*;
pub use comorbidity::*;
pub use feedback::*;
pub use history::*;
pub use medication::*;
pub use metrics::*;
pub use patient::*;
pub use prediction::*;
