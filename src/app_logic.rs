/*
 * This module provides the application logic layer, centered around
 * `SlicerAppLogic`, which acts as the Presenter/Controller of the main window, and
 * `MainWindowUiState`, which holds the window's presentation state (busy/idle,
 * selection, history availability).
 * Unit tests for `SlicerAppLogic` are in `handler_tests.rs`.
 */
pub mod handler;
pub mod main_window_ui_state;
pub mod ui_constants;

#[cfg(test)]
mod handler_tests;

pub use handler::SlicerAppLogic;
pub use main_window_ui_state::MainWindowUiState;
