use clap::{App, Arg, ArgMatches, SubCommand};
use voltcap::{
    blocks::{BlockStream, CaptureFileWriter, FileBlockLoader, FileBlockProducer, StreamConfig},
    config::{DEFAULT_BLOCK_SIZE, DEFAULT_HEADER_SIZE},
    header::{keys, AsciiHeader},
    layout::HeapLayout,
    random::RandomSequence,
    Result, VoltcapError,
};
use std::str::FromStr;

fn main() -> Result<()> {
    env_logger::init();

    let matches = App::new("voltcap-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Voltage capture layout and integrity tool")
        .subcommand(
            SubCommand::with_name("header")
                .about("Print the header of a captured file")
                .arg(
                    Arg::with_name("file")
                        .short("f")
                        .long("file")
                        .value_name("FILE")
                        .help("Captured file")
                        .required(true)
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("layout")
                .about("Compute the heap layout of a data/weights header pair")
                .arg(
                    Arg::with_name("data")
                        .short("d")
                        .long("data")
                        .value_name("HEADER")
                        .help("Data stream header file")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("weights")
                        .short("w")
                        .long("weights")
                        .value_name("HEADER")
                        .help("Weights stream header file")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("json")
                        .long("json")
                        .help("Print the layout as JSON"),
                ),
        )
        .subcommand(
            SubCommand::with_name("generate")
                .about("Write a captured file with a random payload")
                .arg(
                    Arg::with_name("header")
                        .long("header")
                        .value_name("HEADER")
                        .help("Header file for the new capture")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .value_name("FILE")
                        .help("Captured file to create")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("bytes")
                        .short("b")
                        .long("bytes")
                        .value_name("BYTES")
                        .help("Payload size in bytes")
                        .default_value("1048576")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("verify")
                .about("Check a captured payload against its random sequence")
                .arg(
                    Arg::with_name("file")
                        .short("f")
                        .long("file")
                        .value_name("FILE")
                        .help("Captured file")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("copy")
                        .long("copy")
                        .help("Read through a copying loader instead of a memory mapping"),
                )
                .arg(
                    Arg::with_name("block_size")
                        .short("b")
                        .long("block-size")
                        .value_name("BYTES")
                        .help("Loader block size")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("info")
                .about("Show version information"),
        )
        .get_matches();

    match matches.subcommand() {
        ("header", Some(header_matches)) => show_header(header_matches),
        ("layout", Some(layout_matches)) => show_layout(layout_matches),
        ("generate", Some(generate_matches)) => generate_capture(generate_matches),
        ("verify", Some(verify_matches)) => verify_capture(verify_matches),
        ("info", Some(_)) => show_info(),
        _ => {
            println!("Use --help for usage information");
            Ok(())
        }
    }
}

/// Parse a named argument
fn arg<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T> {
    let value = matches
        .value_of(name)
        .ok_or_else(|| VoltcapError::validation(name, "missing argument"))?;
    value
        .parse()
        .map_err(|_| VoltcapError::validation(name, format!("invalid value '{}'", value)))
}

fn show_header(matches: &ArgMatches) -> Result<()> {
    let path: String = arg(matches, "file")?;
    let producer = FileBlockProducer::open(path)?;
    print!("{}", producer.header());
    println!("# payload {} bytes", producer.payload().len());
    Ok(())
}

fn show_layout(matches: &ArgMatches) -> Result<()> {
    let data = AsciiHeader::load_from_file(arg::<String>(matches, "data")?)?;
    let weights = AsciiHeader::load_from_file(arg::<String>(matches, "weights")?)?;
    let layout = HeapLayout::configure(&data, &weights)?;

    if matches.is_present("json") {
        let json = serde_json::to_string_pretty(&layout)
            .map_err(|e| VoltcapError::io(format!("Failed to format layout: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    println!("Heap layout:");
    println!("  Packets per heap:      {}", layout.packets_per_heap());
    println!("  Channels per packet:   {}", layout.nchan_per_packet());
    println!("  Samples per packet:    {}", layout.nsamp_per_packet());
    println!("  Data packet stride:    {} bytes", layout.data_packet_stride());
    println!("  Weights packet stride: {} bytes", layout.weights_packet_stride());
    println!("    scales  @ {} ({} bytes)", layout.packet_scales_offset(), layout.packet_scales_size());
    println!("    weights @ {} ({} bytes)", layout.packet_weights_offset(), layout.packet_weights_size());
    println!("  Data heap stride:      {} bytes", layout.data_heap_stride());
    println!("  Weights heap stride:   {} bytes", layout.weights_heap_stride());
    Ok(())
}

fn generate_capture(matches: &ArgMatches) -> Result<()> {
    let mut header = AsciiHeader::load_from_file(arg::<String>(matches, "header")?)?;
    let output: String = arg(matches, "output")?;
    let bytes: u64 = arg(matches, "bytes")?;

    if !header.has(keys::HDR_SIZE) {
        header.set(keys::HDR_SIZE, DEFAULT_HEADER_SIZE);
    }
    if !header.has(keys::OBS_OFFSET) {
        header.set(keys::OBS_OFFSET, 0);
    }

    let mut sequence = RandomSequence::from_header(&header)?;
    sequence.seek(header.get_u64(keys::OBS_OFFSET)?);

    let mut writer = CaptureFileWriter::create(&output, &header)?;
    let mut block = vec![0u8; DEFAULT_BLOCK_SIZE];
    let mut remaining = bytes;
    while remaining > 0 {
        let len = remaining.min(block.len() as u64) as usize;
        sequence.generate(&mut block[..len]);
        writer.write_block(&block[..len])?;
        remaining -= len as u64;
    }
    let written = writer.finish()?;

    println!("Wrote {} payload bytes to {}", written, output);
    Ok(())
}

fn verify_capture(matches: &ArgMatches) -> Result<()> {
    let path: String = arg(matches, "file")?;
    let mut stream: Box<dyn BlockStream> = if matches.is_present("copy") {
        let mut config = StreamConfig::new(&path);
        if matches.is_present("block_size") {
            config = config.with_block_size(arg(matches, "block_size")?);
        }
        Box::new(FileBlockLoader::with_config(config)?)
    } else {
        Box::new(FileBlockProducer::open(&path)?)
    };

    let mut sequence = RandomSequence::from_header(stream.header())?;
    let start = std::time::Instant::now();
    let mut checked = 0u64;
    let mut failed_at = None;

    loop {
        let block = stream.next_block()?;
        if block.is_end() {
            break;
        }
        sequence.seek(block.obs_offset());
        if !sequence.validate(block.data()) {
            failed_at = Some(block.obs_offset());
            break;
        }
        checked += block.len() as u64;
    }

    let elapsed = start.elapsed();
    match failed_at {
        Some(offset) => {
            println!("FAILED: block at observation offset {} does not match", offset);
            std::process::exit(1);
        }
        None => {
            println!("OK: {} bytes verified in {:.2}ms", checked, elapsed.as_secs_f64() * 1000.0);
            Ok(())
        }
    }
}

fn show_info() -> Result<()> {
    println!("voltcap {}", voltcap::VERSION);
    println!("Supported data NBIT: {:?}", voltcap::config::SUPPORTED_NBITS);
    println!("Default header size: {} bytes", DEFAULT_HEADER_SIZE);
    Ok(())
}
