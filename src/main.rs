use clap::{arg,crate_version,value_parser,Command};
use adahuff::{fgk,Options,STD_OPTIONS};

const RCH: &str = "unreachable was reached";

fn coding_args(cmd: Command) -> Command {
    cmd.arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .arg(arg!(--dpcm "apply the first difference filter"))
        .arg(arg!(--"min-symbol" <VAL> "lowest symbol value in the alphabet")
            .value_parser(value_parser!(u8)).default_value("0"))
        .arg(arg!(--"max-symbol" <VAL> "highest symbol value in the alphabet")
            .value_parser(value_parser!(u8)).default_value("255"))
}

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    env_logger::init();
    let long_help =
"Examples:
---------
Compress:      `adahuff compress -i my_expanded -o my_compressed`
Expand:        `adahuff expand -i my_compressed -o my_expanded`
Filtered:      `adahuff compress --dpcm -i my_samples -o my_compressed`";

    let mut main_cmd = Command::new("adahuff")
        .about("Compress and expand with adaptive Huffman coding")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(coding_args(Command::new("compress"))
        .about("compress a file"));
    main_cmd = main_cmd.subcommand(coding_args(Command::new("expand"))
        .about("expand a file"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let opt = Options {
            min_symbol: *cmd.get_one::<u8>("min-symbol").expect(RCH),
            max_symbol: *cmd.get_one::<u8>("max-symbol").expect(RCH),
            dpcm: cmd.get_flag("dpcm"),
            ..STD_OPTIONS
        };
        let dat = std::fs::read(path_in)?;
        log::info!("original size: {} bytes",dat.len());
        let compressed = fgk::compress_slice(&dat,&opt)?;
        std::fs::write(path_out,&compressed)?;
        log::info!("compressed size: {} bytes",compressed.len());
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let opt = Options {
            min_symbol: *cmd.get_one::<u8>("min-symbol").expect(RCH),
            max_symbol: *cmd.get_one::<u8>("max-symbol").expect(RCH),
            dpcm: cmd.get_flag("dpcm"),
            ..STD_OPTIONS
        };
        let dat = std::fs::read(path_in)?;
        log::info!("compressed size: {} bytes",dat.len());
        let expanded = fgk::expand_slice(&dat,&opt)?;
        std::fs::write(path_out,&expanded)?;
        log::info!("expanded size: {} bytes",expanded.len());
    }

    Ok(())
}
