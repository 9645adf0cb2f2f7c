use statelink_frame::{FRAME_SIZE, MARKER};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("statelink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: statelink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("STATELINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "wire: marker={:02X?} frame_size={FRAME_SIZE} encoding=f32-le",
        MARKER
    );
    println!("features: serial={}", cfg!(feature = "serial"));

    Ok(SUCCESS)
}
