//! Linux bridge ioctl syscalls
//!
//! Native ioctl operations for the legacy bridge control interface, replacing
//! brctl commands.

use crate::network::control::{ControlHandle, ControlPlane, IfFlags, IfIndex};
use crate::network::ifname::{IFNAMSIZ, IfName};
use nix::sys::socket::{AddressFamily, SockFlag, SockType, socket};
use std::io;
use std::os::fd::{AsRawFd, OwnedFd};

// Bridge requests from linux/sockios.h
const SIOCGIFBR: libc::c_ulong = 0x8940;
const SIOCBRADDBR: libc::c_ulong = 0x89a0;
const SIOCBRDELBR: libc::c_ulong = 0x89a1;
const SIOCBRADDIF: libc::c_ulong = 0x89a2;
const SIOCBRDELIF: libc::c_ulong = 0x89a3;
const SIOCDEVPRIVATE: libc::c_ulong = 0x89f0;

const SIOCGIFFLAGS: libc::c_ulong = 0x8913;
const SIOCSIFFLAGS: libc::c_ulong = 0x8914;

// Sub-commands from linux/if_bridge.h
const BRCTL_GET_BRIDGES: libc::c_ulong = 1;
const BRCTL_GET_PORT_LIST: libc::c_ulong = 7;

/// Bytes of the `ifr_ifru` union in `struct ifreq`
const IFRU_SIZE: usize = 24;

#[repr(C)]
struct IfReqIndex {
    ifr_name: [libc::c_char; IFNAMSIZ],
    ifr_ifindex: libc::c_int,
    _padding: [u8; IFRU_SIZE - std::mem::size_of::<libc::c_int>()],
}

#[repr(C)]
struct IfReqData {
    ifr_name: [libc::c_char; IFNAMSIZ],
    ifr_data: *mut libc::c_void,
    _padding: [u8; IFRU_SIZE - std::mem::size_of::<*mut libc::c_void>()],
}

#[repr(C)]
struct IfReqFlags {
    ifr_name: [libc::c_char; IFNAMSIZ],
    ifr_flags: libc::c_short,
    _padding: [u8; IFRU_SIZE - std::mem::size_of::<libc::c_short>()],
}

/// Datagram socket used purely as an ioctl handle
///
/// The descriptor is closed when the socket is dropped.
#[derive(Debug)]
pub struct ControlSocket {
    fd: OwnedFd,
}

impl ControlSocket {
    /// Open a new `AF_INET` datagram socket
    pub fn open() -> io::Result<Self> {
        let fd = socket(
            AddressFamily::Inet,
            SockType::Datagram,
            SockFlag::SOCK_CLOEXEC,
            None,
        )?;
        Ok(Self { fd })
    }

    /// Issue an ioctl, reissuing it if a signal interrupts the call
    fn ioctl<T>(&self, request: libc::c_ulong, arg: *mut T) -> io::Result<libc::c_int> {
        loop {
            let result = unsafe { libc::ioctl(self.fd.as_raw_fd(), request as _, arg) };
            if result >= 0 {
                return Ok(result);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    fn port_request(
        &self,
        request: libc::c_ulong,
        bridge: &IfName,
        port: IfIndex,
    ) -> io::Result<()> {
        let mut req: IfReqIndex = unsafe { std::mem::zeroed() };
        req.ifr_name = bridge.to_c_buf();
        req.ifr_ifindex = port.get() as libc::c_int;

        self.ioctl(request, &mut req)?;
        Ok(())
    }

    fn flags_request(&self, request: libc::c_ulong, req: &mut IfReqFlags) -> io::Result<()> {
        self.ioctl(request, req as *mut IfReqFlags)?;
        Ok(())
    }
}

impl ControlHandle for ControlSocket {
    fn add_bridge(&self, name: &IfName) -> io::Result<()> {
        let mut buf = name.to_c_buf();
        self.ioctl(SIOCBRADDBR, buf.as_mut_ptr())?;
        Ok(())
    }

    fn del_bridge(&self, name: &IfName) -> io::Result<()> {
        let mut buf = name.to_c_buf();
        self.ioctl(SIOCBRDELBR, buf.as_mut_ptr())?;
        Ok(())
    }

    fn add_port(&self, bridge: &IfName, port: IfIndex) -> io::Result<()> {
        self.port_request(SIOCBRADDIF, bridge, port)
    }

    fn del_port(&self, bridge: &IfName, port: IfIndex) -> io::Result<()> {
        self.port_request(SIOCBRDELIF, bridge, port)
    }

    fn bridge_indices(&self, slots: &mut [libc::c_int]) -> io::Result<usize> {
        let mut args: [libc::c_ulong; 3] = [
            BRCTL_GET_BRIDGES,
            slots.as_mut_ptr() as libc::c_ulong,
            slots.len() as libc::c_ulong,
        ];

        let count = self.ioctl(SIOCGIFBR, args.as_mut_ptr())?;
        Ok(count as usize)
    }

    fn port_indices(&self, bridge: &IfName, slots: &mut [libc::c_int]) -> io::Result<()> {
        let mut args = port_list_args(slots);

        let mut req: IfReqData = unsafe { std::mem::zeroed() };
        req.ifr_name = bridge.to_c_buf();
        req.ifr_data = args.as_mut_ptr() as *mut libc::c_void;

        self.ioctl(SIOCDEVPRIVATE, &mut req)?;
        Ok(())
    }

    fn link_flags(&self, name: &IfName) -> io::Result<IfFlags> {
        let mut req: IfReqFlags = unsafe { std::mem::zeroed() };
        req.ifr_name = name.to_c_buf();

        self.flags_request(SIOCGIFFLAGS, &mut req)?;
        Ok(IfFlags::from_bits_retain(req.ifr_flags))
    }

    fn set_link_flags(&self, name: &IfName, flags: IfFlags) -> io::Result<()> {
        let mut req: IfReqFlags = unsafe { std::mem::zeroed() };
        req.ifr_name = name.to_c_buf();
        req.ifr_flags = flags.bits();

        self.flags_request(SIOCSIFFLAGS, &mut req)
    }
}

/// Argument block for `BRCTL_GET_PORT_LIST`
///
/// The device-private handler copies four words from userspace; the last is
/// unused and stays zero.
fn port_list_args(slots: &mut [libc::c_int]) -> [libc::c_ulong; 4] {
    [
        BRCTL_GET_PORT_LIST,
        slots.as_mut_ptr() as libc::c_ulong,
        slots.len() as libc::c_ulong,
        0,
    ]
}

/// The running kernel, reached through ioctl sockets
#[derive(Debug, Clone, Copy, Default)]
pub struct IoctlControl;

impl ControlPlane for IoctlControl {
    type Handle = ControlSocket;

    fn acquire(&self) -> io::Result<ControlSocket> {
        ControlSocket::open()
    }

    fn name_to_index(&self, name: &IfName) -> Option<IfIndex> {
        nix::net::if_::if_nametoindex(name.as_str())
            .ok()
            .and_then(IfIndex::new)
    }

    fn index_to_name(&self, index: IfIndex) -> Option<String> {
        let mut buf = [0 as libc::c_char; IFNAMSIZ];
        let result = unsafe { libc::if_indextoname(index.get(), buf.as_mut_ptr()) };
        if result.is_null() {
            return None;
        }
        IfName::from_c_buf(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ifreq_layouts_match_kernel() {
        // struct ifreq is IFNAMSIZ plus a 24-byte union on every Linux ABI
        assert_eq!(std::mem::size_of::<IfReqIndex>(), 40);
        assert_eq!(std::mem::size_of::<IfReqData>(), 40);
        assert_eq!(std::mem::size_of::<IfReqFlags>(), 40);
    }

    #[test]
    fn test_port_list_args_fill_four_words() {
        let mut slots = [0 as libc::c_int; 8];
        let args = port_list_args(&mut slots);
        assert_eq!(args.len(), 4);
        assert_eq!(args[0], BRCTL_GET_PORT_LIST);
        assert_eq!(args[1], slots.as_ptr() as libc::c_ulong);
        assert_eq!(args[2], 8);
        assert_eq!(args[3], 0);
    }

    #[test]
    fn test_resolve_loopback() {
        let control = IoctlControl;
        let lo = IfName::new("lo").unwrap();
        let index = control.name_to_index(&lo).expect("lo should always exist");
        assert_eq!(control.index_to_name(index).as_deref(), Some("lo"));
    }

    #[test]
    fn test_resolve_missing_interface() {
        let control = IoctlControl;
        let name = IfName::new("nonexistent123").unwrap();
        assert!(control.name_to_index(&name).is_none());
    }

    #[test]
    fn test_socket_opens_and_reads_flags() {
        let sock = ControlSocket::open().unwrap();
        let flags = sock.link_flags(&IfName::new("lo").unwrap()).unwrap();
        assert!(flags.contains(IfFlags::LOOPBACK));
    }
}
