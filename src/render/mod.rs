//! Render subsystem: size-adaptive slot visibility and the render plan produced
//! for a display surface. The rendering toolkit consuming the plan is out of scope;
//! this module only decides *what* is shown.

pub mod surface;
pub mod viewport;
