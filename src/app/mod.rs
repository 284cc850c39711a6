pub mod ports;
pub mod lookup_use_case;

pub use lookup_use_case::{LookupOutcome, LookupUseCase, SourceFailure, SourceHit};
