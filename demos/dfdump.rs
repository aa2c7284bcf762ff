use std::env;
use std::error::Error;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;
use serde_json::json;

use dataflash::DataFlashParser;

/// Usage: dfdump <log.bin> [MESSAGE...]
///
/// Prints the log's schemas, then one JSON object per message with scaled values.
fn main() -> Result<(), Box<dyn Error>> {
    Builder::new()
        .filter(None, LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("Usage: dfdump <log.bin> [MESSAGE...]");
        std::process::exit(2);
    };
    let names: Vec<String> = args.collect();

    let mut parser = dataflash::open(&path)?;

    for schema in parser.schemas().iter() {
        eprintln!("{schema}");
    }

    if !names.is_empty() {
        parser.set_filter(&names)?;
    }

    let count = dump(&mut parser)?;
    log::info!("{count} messages read from {path}");

    Ok(())
}

fn dump<R: std::io::Read + std::io::Seek>(
    parser: &mut DataFlashParser<R>,
) -> Result<usize, Box<dyn Error>> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut count = 0;

    for message in parser {
        let message = message?;
        let line = json!({
            "name": message.name,
            "seq": message.sequence_number,
            "time_us": message.time_micros,
            "values": message.get_scaled_all(),
        });
        writeln!(out, "{line}")?;
        count += 1;
    }

    Ok(count)
}
