pub mod finding;
pub mod decision;
pub mod scan_result;

pub use finding::*;
pub use decision::*;
pub use scan_result::*;
