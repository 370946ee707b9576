mod cli;
mod error_fmt;
mod http;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use eyre::{Result, WrapErr, eyre};
use tank_config::Config;
use tank_core::{
    ControlLoop, Dispatcher, DistanceSampler, LoopCfg, Mailbox, NotifyCfg, SamplerCfg, SharedTank,
    TankError, instant_level,
};
use tank_hardware::{LogTransport, SystemWallClock};
use tank_traits::{Actuator, Clock, MonotonicClock, Ranger};
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};

type Io = (Box<dyn Ranger + Send>, Box<dyn Actuator + Send>);

fn main() {
    if let Err(e) = real_main() {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", error_fmt::format_error_json(&e));
        } else {
            eprintln!("{}", error_fmt::humanize(&e));
        }
        std::process::exit(error_fmt::exit_code_for_error(&e));
    }
}

fn real_main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let cfg = tank_config::load_file(&cli.config).wrap_err("loading configuration")?;
    init_tracing(&cli, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "configuration loaded");

    match cli.cmd {
        Commands::Run { bind, cycles } => run(&cfg, bind, cycles, cli.json),
        Commands::SelfCheck => self_check(&cfg, cli.json),
    }
}

fn init_tracing(cli: &Cli, logging: &tank_config::Logging) -> Result<()> {
    let level = cli
        .log_level
        .as_deref()
        .or(logging.level.as_deref())
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid log level {level:?}"))?;

    // Logs go to stderr; stdout carries command output only.
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if cli.json {
        layers.push(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .boxed(),
        );
    } else {
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .boxed(),
        );
    }

    if let Some(file) = &logging.file {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre!("logging.file {file:?} has no file name"))?;
        let appender = match logging.rotation.as_deref().unwrap_or("never") {
            "daily" => tracing_appender::rolling::daily(dir, name),
            "hourly" => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| eyre!("tracing init: {e}"))
}

#[cfg(feature = "hardware")]
fn build_io(cfg: &Config) -> Result<Io> {
    use tank_hardware::{HardwareActuator, HardwareRanger};

    let ranger = HardwareRanger::new(cfg.pins.trig, cfg.pins.echo)
        .wrap_err("open ultrasonic sensor pins")?;
    let actuator = HardwareActuator::new(cfg.pins.relay, cfg.pins.buzzer, cfg.pins.relay_active_low)
        .wrap_err("open relay/buzzer pins")?;
    tracing::info!(
        trig = cfg.pins.trig,
        echo = cfg.pins.echo,
        relay = cfg.pins.relay,
        buzzer = cfg.pins.buzzer,
        "GPIO backend ready"
    );
    Ok((Box::new(ranger), Box::new(actuator)))
}

#[cfg(not(feature = "hardware"))]
fn build_io(cfg: &Config) -> Result<Io> {
    use tank_hardware::{SimTankParams, SimulatedTank};

    let mut params = SimTankParams {
        height_cm: cfg.tank.height_cm,
        ..SimTankParams::default()
    };
    // Test hooks for the simulated backend.
    if std::env::var_os("TANK_TEST_SIM_TIMEOUT").is_some() {
        params.always_timeout = true;
    }
    if let Ok(v) = std::env::var("TANK_TEST_SIM_START_PCT") {
        params.start_level_pct = v
            .parse()
            .wrap_err_with(|| format!("TANK_TEST_SIM_START_PCT={v:?} is not a number"))?;
    }
    tracing::info!(
        height_cm = params.height_cm,
        start_level_pct = params.start_level_pct,
        "simulated tank backend"
    );
    let tank = SimulatedTank::new(params);
    Ok((Box::new(tank.ranger()), Box::new(tank.actuator())))
}

fn build_transport() -> LogTransport {
    // Test hook: every send fails as if the network were down.
    if std::env::var_os("TANK_TEST_MAIL_OFFLINE").is_some() {
        tracing::warn!("mail transport offline");
        return LogTransport::offline();
    }
    LogTransport::new()
}

fn run(cfg: &Config, bind: Option<String>, cycles: Option<u64>, json: bool) -> Result<()> {
    let shared = SharedTank::new();
    let mailbox = Mailbox::new();
    let wall = SystemWallClock::new(cfg.time.utc_offset_secs);
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new());

    // Bind before touching the relay so a busy port cannot leave the pump running.
    let bind = bind.unwrap_or_else(|| cfg.http.bind.clone());
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("starting async runtime")?;
    let listener = rt
        .block_on(tokio::net::TcpListener::bind(bind.as_str()))
        .wrap_err_with(|| format!("binding telemetry endpoint {bind}"))?;
    let local = listener.local_addr().wrap_err("reading bound address")?;
    tracing::info!(addr = %local, "telemetry endpoint listening");

    let (ranger, actuator) = build_io(cfg)?;
    let mut ctl = ControlLoop::new(
        ranger,
        actuator,
        wall,
        shared.clone(),
        mailbox.clone(),
        LoopCfg::from(cfg),
        clock,
    )?;
    ctl.boot()?;

    let dispatcher = cfg.notify.enabled.then(|| {
        Dispatcher::spawn(
            mailbox.clone(),
            build_transport(),
            wall,
            shared.clone(),
            NotifyCfg::from(&cfg.notify),
        )
    });

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .wrap_err("installing Ctrl-C handler")?;
    }

    let control = {
        let stop = stop.clone();
        std::thread::Builder::new()
            .name("control-loop".into())
            .spawn(move || {
                let res = ctl.run(&stop, cycles);
                stop.store(true, Ordering::Relaxed);
                res
            })
            .wrap_err("spawning control loop thread")?
    };

    let app = http::router(shared.clone());
    let served = rt.block_on(async {
        let stop = stop.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                while !stop.load(Ordering::Relaxed) {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            })
            .await
    });
    // Make sure the loop stops even if the server ended on its own.
    stop.store(true, Ordering::Relaxed);

    let cycles_run = control
        .join()
        .map_err(|_| eyre!("control loop thread panicked"))??;
    drop(dispatcher);
    served.wrap_err("telemetry endpoint failed")?;
    tracing::info!(cycles = cycles_run, "shutdown complete");

    let snap = http::DataResponse::from(&shared.snapshot());
    let out = if json {
        serde_json::to_string(&snap)
    } else {
        serde_json::to_string_pretty(&snap)
    }
    .wrap_err("serializing final snapshot")?;
    println!("{out}");
    Ok(())
}

fn self_check(cfg: &Config, json: bool) -> Result<()> {
    let (ranger, _actuator) = build_io(cfg)?;
    let mut sampler = DistanceSampler::new(
        ranger,
        SamplerCfg::from(&cfg.sampler),
        Arc::new(MonotonicClock::new()),
    );
    let distance_cm = sampler.sample();
    let level = instant_level(distance_cm, cfg.tank.height_cm)
        .ok_or(TankError::SensorInvalid { distance_cm })
        .wrap_err("self-check reading")?;
    tracing::info!(distance_cm, level_pct = level, "self-check ok");
    if json {
        println!(
            "{}",
            serde_json::json!({ "distance_cm": distance_cm, "level": (level * 10.0).round() / 10.0 })
        );
    } else {
        println!("distance: {distance_cm:.1} cm, level: {level:.1} %");
    }
    Ok(())
}
