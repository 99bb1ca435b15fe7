pub mod hook_args;
pub mod hook_callback;
pub mod hook_filter;
pub mod hook_kind;
pub mod hook_order;
pub mod plugin_idx;
