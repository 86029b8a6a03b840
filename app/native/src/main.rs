#![allow(clippy::multiple_crate_versions)]

//! MotionDesk - animated and video desktop wallpapers.
//!
//! One binary serves as both the daemon (`motiondesk daemon`) and the CLI that
//! controls it.

fn main() {
    if let Err(err) = motiondesk_lib::cli::run() {
        eprintln!("motiondesk: {err}");
        std::process::exit(1);
    }
}
