use clap::{App, Arg};
use route_rs_router::{
    Router, RouterConfig, RouteTable, RouterError, SystemClock, UdpLinkTransport,
};
use std::path::Path;
use std::process;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let matches = App::new("route-rs router")
        .version("0.1")
        .author("Route-rs Contributors")
        .about("Software IPv4 router with ARP, RIP and ICMP over UDP emulated links")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("Router config (TOML)")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("rtable")
                .short("r")
                .long("rtable")
                .value_name("FILE")
                .help("Static route table; overrides the config's rtable")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Log every packet decision"),
        )
        .get_matches();

    let default_level = if matches.is_present("verbose") {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = matches.value_of("config").unwrap();
    let rtable = matches.value_of("rtable").map(Path::new);

    if let Err(e) = run(Path::new(config), rtable) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(config_path: &Path, rtable_override: Option<&Path>) -> Result<(), RouterError> {
    let config = RouterConfig::load(config_path)?;
    let interfaces = config.interface_table()?;
    for iface in interfaces.iter() {
        info!("{}", iface);
    }

    let routes = RouteTable::new();
    let rtable = rtable_override.map(Path::to_path_buf).or(config.rtable.clone());
    if let Some(rtable) = rtable {
        routes.load_static(&rtable)?;
    }

    let transport = UdpLinkTransport::open(config.udp_links()?)?;
    let router = Arc::new(Router::new(
        interfaces,
        routes,
        Arc::new(transport),
        Arc::new(SystemClock),
    )?);
    router.init();

    Router::start(router)?.serve();
    info!("The world has been routed");
    Ok(())
}
