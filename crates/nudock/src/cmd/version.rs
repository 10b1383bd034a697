use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("nudock {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: nudock");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("handshake_version: {}", nudock_endpoint::VERSION);
    println!("schemas_dir: {}", nudock_endpoint::DEFAULT_SCHEMAS_DIR);
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("NUDOCK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "transports: localhost, unix-domain-socket={}",
        cfg!(unix)
    );

    Ok(SUCCESS)
}
