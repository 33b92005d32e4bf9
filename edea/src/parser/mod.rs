pub mod fields;
pub mod format_detector;
pub mod kicad;
pub mod pcb;
pub mod schema;
pub mod sexp;
pub mod shapes;
pub mod symbol;

// Re-export for convenience
pub use fields::{FromSExp, ModelError};
pub use format_detector::{detect_format, FileFormat, FileKind};
pub use kicad::{KicadError, KicadParser};
pub use pcb::{footprint_bounding_box, pad_corners, Pcb, PcbError};
pub use schema::*;
pub use sexp::{from_str, ParseError, SExp, SExpParser};
