pub mod result_view;
pub mod selection_overlay;
