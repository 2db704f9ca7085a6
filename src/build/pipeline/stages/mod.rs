//! Default pipeline stages.
//!
//! The standard build pipeline consists of:
//!
//! 1. **CollectionsStage** - Group files into named, ordered collections
//! 2. **MarkdownStage** - Convert markdown to HTML
//! 3. **PermalinkStage** - Move `name.html` to `name/index.html`
//! 4. **TemplateStage** - Render Tera templates from the source tree
//! 5. **StylesheetStage** - Compile LESS to CSS
//! 6. **LayoutStage** - Wrap HTML pages in their layout
//! 7. **WriteStage** - Write the final tree to the output directory

mod collections;
mod layout;
mod markdown;
mod permalinks;
mod stylesheet;
mod template;
mod write;

pub use collections::CollectionsStage;
pub use layout::LayoutStage;
pub use markdown::MarkdownStage;
pub use permalinks::PermalinkStage;
pub use stylesheet::StylesheetStage;
pub use template::TemplateStage;
pub use write::{WriteStage, clean_output_dir};
