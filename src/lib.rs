//! # shape-raster
//!
//! Filled vector shape rasterizer. A shape records path commands (moves,
//! lines, quadratic and cubic Bezier segments, closes), resolves overlapping
//! and self-intersecting geometry with a winding rule, computes antialiased
//! and optionally feathered coverage, and composites its color into a pixel
//! surface with one of sixteen blend methods.
//!
//! ## Pipeline
//!
//! 1. **Path recorder** (`path_storage`): command stream with smooth-curve
//!    resolution
//! 2. **Curve flattener** (`curves`): adaptive subdivision into edges
//! 3. **Intersector** (`intersector`): cached edge table with a y-band index
//! 4. **Winding resolver** (`winding`): non-zero / even-odd, invert
//! 5. **Coverage rasterizer** (`polyspan`, `blur`): exact-area spans or
//!    pixel-centre samples, then feather
//! 6. **Compositor** (`compositor`, `blend`, `surface`): blended writes
//!
//! ```
//! use shape_raster::{CoverageMask, Quality, RenderDesc, Shape};
//!
//! let mut shape = Shape::new();
//! shape.move_to(1.0, 1.0);
//! shape.line_to(7.0, 1.0);
//! shape.line_to(7.0, 7.0);
//! shape.line_to(1.0, 7.0);
//! shape.close();
//!
//! let mut mask = CoverageMask::new(8, 8);
//! assert!(shape.render_coverage(&mut mask, &RenderDesc::unit(8, 8), Quality::BEST));
//! assert_eq!(mask.pixel(3, 3), Some(1.0));
//! assert_eq!(mask.pixel(0, 0), Some(0.0));
//! ```

// Foundation types & math
pub mod basics;
pub mod color;
pub mod error;
pub mod math;

// Geometry
pub mod curves;
pub mod intersector;
pub mod path_storage;
pub mod winding;

// Rasterization
pub mod blur;
pub mod polyspan;
pub mod render_desc;

// Compositing
pub mod blend;
pub mod compositor;
pub mod surface;

// Shape layer
pub mod params;
pub mod shape;

pub use basics::{PointD, RectD, RectI};
pub use blend::BlendMethod;
pub use blur::BlurType;
pub use color::{Rgba, Rgba8};
pub use error::{Result, ShapeError};
pub use params::{param_vocab, Invalidation, ParamInfo, ParamValue, ShapeParams};
pub use path_storage::{PathCommand, ShapePath};
pub use render_desc::{Quality, RenderDesc};
pub use shape::Shape;
pub use surface::{CoverageMask, ImageSurface, PixelBlend, Rgba8Surface, RgbaSurface, Surface};
pub use winding::WindingStyle;
