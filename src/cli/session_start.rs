use crate::hooks::session;
use crate::layout::Layout;

/// Print the previous-session notice, if any; never fails
pub fn run(layout: &Layout) {
    if let Some(lines) = session::report(layout) {
        for line in lines {
            println!("{}", line);
        }
    }
}
