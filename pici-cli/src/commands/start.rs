use clap::Args;
use pici::{CommandRunner, EmulatorConfig, SystemRunner};

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Host port forwarded to SSH in the guest
    #[arg(short, long, env = "PORT", default_value_t = 2222)]
    pub port: u16,

    /// Image file in the distribution folder
    #[arg(long)]
    pub image: Option<String>,

    /// QEMU machine type
    #[arg(long, env = "MACHINE_TYPE", default_value = "virt")]
    pub machine: String,

    /// CPU model
    #[arg(long, env = "CPU_TYPE", default_value = "cortex-a53")]
    pub cpu: String,

    /// Number of CPUs
    #[arg(long, env = "CPU_NUMBER", default_value_t = 4)]
    pub smp: u8,

    /// Guest memory
    #[arg(long, env = "RAM_SIZE", default_value = "1G")]
    pub memory: String,
}

pub fn execute(args: StartArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let layout = match &args.image {
        Some(image) => global.layout_with_image(image),
        None => global.layout(),
    };
    layout.provision()?;

    let config = EmulatorConfig {
        machine: args.machine,
        cpu: args.cpu,
        memory: args.memory,
        smp: args.smp,
        ssh_port: args.port,
    };

    tracing::info!("Starting the emulator");
    tracing::info!(
        "Using kernel {}, image {}, machine {}, {} x {}, {} RAM",
        layout.kernel_path().display(),
        layout.image_path().display(),
        config.machine,
        config.smp,
        config.cpu,
        config.memory
    );
    SystemRunner::new().run(&config.command(&layout))?;
    Ok(())
}
