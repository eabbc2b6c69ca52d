use anyhow::{bail, Context, Result};
use std::iter::Peekable;
use std::str::FromStr;

use optolink_proto::{SensorRegistry, Session};

const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

fn cmd_get(session: &mut Session<'_, Box<dyn serialport::SerialPort>>) -> Result<()> {
    let measurements = session
        .get_measurements()
        .context("Measurement sweep failed")?;
    for (name, value) in &measurements {
        println!("{:<28} {}", name, value);
    }
    Ok(())
}

fn cmd_set<I: Iterator<Item = String>>(
    args: &mut CmdScanner<I>,
    session: &mut Session<'_, Box<dyn serialport::SerialPort>>,
) -> Result<()> {
    let sensor = args.next()?;
    let value: f64 = args.parse_next()?;
    session
        .write_value(&sensor, value)
        .with_context(|| format!("Failed to set {}", sensor))?;
    println!("{} = {}", sensor, session.read_value(&sensor)?);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = CmdScanner::new(std::env::args().skip(1));
    let device = args.device(std::env::var("VITALK_DEVICE").ok());

    let registry = SensorRegistry::standard();
    let mut session = Session::open(&device, &registry)
        .with_context(|| format!("Failed to connect on {}", device))?;

    match args.next().as_deref().unwrap_or("get") {
        "get" => cmd_get(&mut session),
        "set" => cmd_set(&mut args, &mut session),
        cmd => bail!("Unknown command {}", cmd),
    }
}

struct CmdScanner<I: Iterator<Item = String>> {
    args: Peekable<I>,
}

impl<I: Iterator<Item = String>> CmdScanner<I> {
    fn new(args: I) -> Self {
        Self {
            args: args.peekable(),
        }
    }
    /// vitalk [DEVICE] [get | set <sensor> <value>]
    ///
    /// Takes the leading argument if it is a device path, else falls back to
    /// `env_device` and the default.
    fn device(&mut self, env_device: Option<String>) -> String {
        match self.args.next_if(|arg| arg.starts_with('/')) {
            Some(path) => path,
            None => env_device.unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
        }
    }
    fn next(&mut self) -> Result<String> {
        self.args.next().context("Missing argument")
    }
    fn parse_next<T: FromStr>(&mut self) -> Result<T> {
        let arg = self.next()?;
        arg.parse::<T>()
            .ok()
            .with_context(|| format!("Parse error: {}", arg))
    }
}
