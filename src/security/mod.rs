//! Security scanning interposed on backend calls

mod guard;
mod scanner;

pub use guard::GuardedClient;
pub use scanner::{BackendScanner, MockScanner, ScanContext, ScanDirection, ScanVerdict, Scanner};
