mod view;

pub use view::{
    already_active_line, cancelled_line, confirmed_line, progress_line, sync_warning_line,
    timeout_line, waiting_banner,
};
