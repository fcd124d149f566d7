use argh::FromArgs;
use std::path::PathBuf;

/// Definition of the command line interface. Uses the `argh` derive macro.
#[derive(FromArgs, Debug)]
#[argh(help_triggers("-h", "--help"))]
/// Schedule a dataflow graph, bind it to shared resources and allocate
/// storage for the values flowing between them.
pub struct Opts {
    /// input dataflow graph (JSON)
    #[argh(positional)]
    pub file: PathBuf,

    /// output file, default is stdout
    #[argh(option, short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// schedule period; defaults to the ASAP makespan
    #[argh(option, long = "schedule-time")]
    pub schedule_time: Option<u64>,

    /// schedule on a flat timeline instead of a cyclic one
    #[argh(switch, long = "non-cyclic")]
    pub non_cyclic: bool,

    /// upper bound on processing elements per operator type
    #[argh(option, long = "pe-cap")]
    pub pe_cap: Option<u64>,

    /// upper bound on memories
    #[argh(option, long = "memory-cap")]
    pub memory_cap: Option<u64>,

    /// largest lifetime (in cycles) a value may have and still stay a
    /// plain wire instead of going through a memory
    #[argh(option, long = "wire-threshold", default = "0")]
    pub wire_threshold: u64,

    /// read ports available per memory per cycle
    #[argh(option, long = "read-ports")]
    pub read_ports: Option<usize>,

    /// write ports available per memory per cycle
    #[argh(option, long = "write-ports")]
    pub write_ports: Option<usize>,

    /// combined port budget per memory per cycle (default 1 when no
    /// per-direction budget is given)
    #[argh(option, long = "total-ports")]
    pub total_ports: Option<usize>,

    /// allocate banked memories instead of register files
    #[argh(switch, long = "banked")]
    pub banked: bool,

    /// address multiplexer size for banked allocation
    #[argh(option, long = "adr-mux-size", default = "2")]
    pub adr_mux_size: usize,

    /// address pipeline depth for banked allocation
    #[argh(option, long = "adr-pipe-depth", default = "0")]
    pub adr_pipe_depth: u32,

    /// treat memory inputs as registered (synchronous)
    #[argh(switch, long = "registered-input")]
    pub registered_input: bool,

    /// log level for debugging
    #[argh(option, long = "log", default = "log::LevelFilter::Warn")]
    pub log_level: log::LevelFilter,
}
