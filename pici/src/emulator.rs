//! `qemu-system-aarch64` launch command.

use crate::layout::DistLayout;
use crate::runner::ToolCommand;

const QEMU_SYSTEM: &str = "qemu-system-aarch64";

/// Kernel command line: root on the second virtio partition.
const KERNEL_APPEND: &str = "rw console=ttyAMA0 root=/dev/vda2 rootfstype=ext4 rootdelay=1 loglevel=2";

/// Guest port forwarded to the host SSH port.
const GUEST_SSH_PORT: u16 = 22;

/// Machine settings for the emulated board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmulatorConfig {
    /// QEMU machine type (default: virt)
    pub machine: String,

    /// CPU model (default: cortex-a53)
    pub cpu: String,

    /// Guest memory, in QEMU `-m` syntax (default: 1G)
    pub memory: String,

    /// Number of CPUs (default: 4)
    pub smp: u8,

    /// Host port forwarded to guest SSH (default: 2222)
    pub ssh_port: u16,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            machine: "virt".to_string(),
            cpu: "cortex-a53".to_string(),
            memory: "1G".to_string(),
            smp: 4,
            ssh_port: 2222,
        }
    }
}

impl EmulatorConfig {
    /// Build the emulator invocation for the files in `layout`.
    ///
    /// The console is attached to the terminal, so the command streams.
    pub fn command(&self, layout: &DistLayout) -> ToolCommand {
        let image = layout.image_path();
        let kernel = layout.kernel_path();

        let mut cmd = ToolCommand::mutate(QEMU_SYSTEM)
            .args(["-machine", self.machine.as_str()])
            .args(["-cpu", self.cpu.as_str()])
            .args(["-m", self.memory.as_str()])
            .arg("-smp")
            .arg(self.smp.to_string())
            .arg("-kernel")
            .arg(kernel.to_string_lossy());
        if let Some(dtb) = layout.dtb_path() {
            cmd = cmd.arg("-dtb").arg(dtb.to_string_lossy());
        }
        cmd.args(["-append", KERNEL_APPEND])
            .arg("-drive")
            .arg(format!(
                "file={},format=qcow2,id=hd0,if=none,cache=writeback",
                image.display()
            ))
            .args(["-device", "virtio-blk,drive=hd0,bootindex=0"])
            .arg("-netdev")
            .arg(format!(
                "user,id=mynet,hostfwd=tcp::{}-:{}",
                self.ssh_port, GUEST_SSH_PORT
            ))
            .args(["-device", "virtio-net-pci,netdev=mynet"])
            .args(["-nographic", "-no-reboot"])
            .streaming()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command() {
        let layout = DistLayout::new("/dist", "/base", "distro.qcow2", "kernel.img");
        let cmd = EmulatorConfig {
            ssh_port: 2022,
            ..Default::default()
        }
        .command(&layout);

        assert_eq!(cmd.program(), "qemu-system-aarch64");
        assert!(cmd.is_streaming());
        let args = cmd.arguments();
        let after = |flag: &str| {
            let i = args.iter().position(|a| a == flag).unwrap();
            args[i + 1].clone()
        };
        assert_eq!(after("-machine"), "virt");
        assert_eq!(after("-smp"), "4");
        assert_eq!(after("-kernel"), "/dist/kernel.img");
        assert_eq!(
            after("-drive"),
            "file=/dist/distro.qcow2,format=qcow2,id=hd0,if=none,cache=writeback"
        );
        assert_eq!(after("-netdev"), "user,id=mynet,hostfwd=tcp::2022-:22");
        assert!(!args.iter().any(|a| a == "-dtb"));
    }

    #[test]
    fn test_command_with_dtb() {
        let layout = DistLayout::new("/dist", "/base", "distro.qcow2", "kernel.img")
            .with_dtb("bcm2710-rpi-3-b.dtb");
        let cmd = EmulatorConfig::default().command(&layout);
        assert!(cmd.command_line().contains("-dtb /dist/bcm2710-rpi-3-b.dtb"));
    }
}
