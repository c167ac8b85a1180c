pub mod canonical;
pub mod catalog;
pub mod config;
pub mod datetime;
pub mod editor;
pub mod entities;
pub mod fields;
pub mod pending;
pub mod pronoun;
pub mod registry;
pub mod submit;
pub mod values;
pub mod view;

pub use canonical::{canonicalize, CanonicalPayload, LOOKUP_TITLE};
pub use catalog::IntentOptions;
pub use config::{load_config, validate_config, ConsoleConfig};
pub use datetime::{DateTimeInputs, WeatherTime};
pub use editor::{ButtonLabel, ButtonState, EditorState, Selection};
pub use entities::DataStoreCache;
pub use submit::{prepare_submission, SubmitOutcome};
pub use values::{FieldMap, FieldValue};
pub use view::{project, EditorView};
