pub mod draw;
pub mod labels;
pub mod layout;
pub mod scale;
pub mod text;
pub mod wedge;
