use std::ffi::OsString;

use minitodo_core::CoreError;

fn main() {
    let args: Vec<OsString> = std::env::args_os().collect();
    if let Err(err) = minitodo_core::run(args) {
        let validation = err
            .downcast_ref::<CoreError>()
            .and_then(CoreError::as_validation)
            .or_else(|| err.downcast_ref());
        match validation {
            Some(invalid) => eprintln!("{}", invalid.user_message()),
            None => eprintln!("error: {err:#}"),
        }
        std::process::exit(1);
    }
}
