//! Lunarflow Config
//!
//! This crate contains the serializable workflow document types exchanged with
//! the Lunar backend. A workflow is owned by the backend; clients load it,
//! edit a transient copy and write it back wholesale on save.
//!
//! Documents travel as camelCase JSON:
//!
//! ```json
//! {
//!   "id": "wf-1",
//!   "name": "Summarize",
//!   "description": "",
//!   "components": [{ "label": "A", "name": "Reader", "...": "..." }],
//!   "dependencies": [
//!     {
//!       "sourceLabel": "A",
//!       "targetLabel": "B",
//!       "componentInputKey": "text",
//!       "templateVariableKey": null
//!     }
//!   ],
//!   "invalidErrors": []
//! }
//! ```

mod component;
mod data_type;
mod dependency;
mod input;
mod serde_ext;
mod workflow;

pub use component::{ComponentModel, ComponentOutput, ComponentPosition};
pub use data_type::ComponentDataType;
pub use dependency::ComponentDependency;
pub use input::{ComponentInput, UNDEFINED};
pub use workflow::{Workflow, WorkflowReference};
