mod mock;
mod templates;
mod types;
mod validate;

pub use mock::MockGenerator;
pub use templates::{PLACEHOLDER, Template, TemplateStore};
pub use types::{GenerationRequest, Genre, RawGenerationRequest, StoryLength};
pub use validate::{DEFAULT_GENRE, DEFAULT_LENGTH, DEFAULT_TEMPERATURE, DEFAULT_TOP_P, validate};
