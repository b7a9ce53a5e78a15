//! Application-wide constants.

use uuid::Uuid;

/// Name of the collection every generated preview is stored in.
pub const PREVIEW_COLLECTION_NAME: &str = "download_previews";

/// Target width in pixels for PDF renders, and the bounding box edge for images.
pub const PREVIEW_TARGET_SIZE: u32 = 300;

/// JPEG quality passed to the image converter.
pub const PREVIEW_JPEG_QUALITY: u32 = 90;

/// Extension appended to the original file name to build the preview file name.
pub const PREVIEW_EXTENSION: &str = "jpg";

/// Basename of the file the conversion tools write into their scratch directory.
pub const PREVIEW_OUTPUT_STEM: &str = "preview";

/// The only `PATH` handed to conversion tools. No other environment is inherited.
pub const SAFE_TOOL_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

/// Default program used to render the first page of a PDF.
pub const DEFAULT_PDF_TOOL: &str = "pdftocairo";

/// Default program used to resize everything that is not a PDF.
pub const DEFAULT_IMAGE_TOOL: &str = "convert";

/// Upper bound on a single conversion run.
pub const DEFAULT_CONVERSION_TIMEOUT_SECS: u64 = 60;

/// Namespace for deriving stable collection ids from collection names.
/// Format: 6b1f0c2e-4a5d-5e8f-9b7c-3d2e1f0a9b8c
pub const COLLECTION_NAMESPACE: Uuid = Uuid::from_u128(0x6b1f0c2e_4a5d_5e8f_9b7c_3d2e1f0a9b8c);
