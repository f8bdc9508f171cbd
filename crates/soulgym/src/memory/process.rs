//! Process discovery and raw memory access.
//!
//! Windows targets go through the Win32 debug APIs. On Linux the game runs
//! under Wine/Proton, so the same process is reached through `/proc`.

use crate::error::{Error, Result};

#[cfg(target_os = "windows")]
use windows::Win32::Foundation::{CloseHandle, HANDLE};

/// Exit code reported by `GetExitCodeProcess` for a running process
#[cfg(target_os = "windows")]
const STILL_ACTIVE: u32 = 259;

/// Handle to an opened target process
pub struct ProcessHandle {
    pub pid: u32,
    pub base_address: u64,
    pub name: String,
    #[cfg(target_os = "windows")]
    handle: HANDLE,
    #[cfg(target_os = "linux")]
    mem: std::fs::File,
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("base_address", &format_args!("{:#x}", self.base_address))
            .field("name", &self.name)
            .finish()
    }
}

/// Case-insensitive match of a process or module name against the wanted one.
///
/// Paths are reduced to their file name, with either separator.
pub(crate) fn name_matches(candidate: &str, wanted: &str) -> bool {
    let file_name = candidate
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(candidate)
        .trim_end_matches('\0');
    file_name.eq_ignore_ascii_case(wanted)
}

#[cfg(target_os = "windows")]
impl ProcessHandle {
    /// Find a running process by executable name and open it
    pub fn find_by_name(name: &str) -> Result<Self> {
        use windows::Win32::System::Diagnostics::ToolHelp::{
            CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW,
            TH32CS_SNAPPROCESS,
        };

        // SAFETY: plain Win32 call; the snapshot handle is closed below.
        let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }
            .map_err(|e| Error::ProcessOpenFailed(format!("process snapshot: {}", e)))?;

        let mut entry = PROCESSENTRY32W {
            dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };

        let mut found = None;
        // SAFETY: `entry` is initialized with its size as the API requires.
        let mut next = unsafe { Process32FirstW(snapshot, &mut entry) };
        while next.is_ok() {
            let len = entry
                .szExeFile
                .iter()
                .position(|&c| c == 0)
                .unwrap_or(entry.szExeFile.len());
            let exe = String::from_utf16_lossy(&entry.szExeFile[..len]);
            if name_matches(&exe, name) {
                found = Some(entry.th32ProcessID);
                break;
            }
            // SAFETY: same snapshot and entry as above.
            next = unsafe { Process32NextW(snapshot, &mut entry) };
        }

        // SAFETY: the snapshot is owned here and not used afterwards.
        unsafe {
            let _ = CloseHandle(snapshot);
        }

        let pid = found.ok_or_else(|| Error::ProcessNotFound(name.to_string()))?;
        let mut process = Self::open(pid)?;
        process.name = name.to_string();
        Ok(process)
    }

    /// Open a process by PID with read/write access
    pub fn open(pid: u32) -> Result<Self> {
        use windows::Win32::System::Threading::{
            OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION, PROCESS_VM_READ,
            PROCESS_VM_WRITE,
        };

        let access =
            PROCESS_VM_READ | PROCESS_VM_WRITE | PROCESS_VM_OPERATION | PROCESS_QUERY_INFORMATION;
        // SAFETY: OpenProcess has no memory preconditions; failure is an Err.
        let handle = unsafe { OpenProcess(access, false, pid) }
            .map_err(|e| Error::ProcessOpenFailed(format!("pid {}: {}", pid, e)))?;

        let (name, base_address) = match Self::main_module(pid) {
            Ok(module) => module,
            Err(e) => {
                // SAFETY: the handle was opened above and is not stored.
                unsafe {
                    let _ = CloseHandle(handle);
                }
                return Err(e);
            }
        };

        Ok(Self {
            pid,
            base_address,
            name,
            handle,
        })
    }

    /// Name and base address of the first module in the process
    fn main_module(pid: u32) -> Result<(String, u64)> {
        use windows::Win32::System::Diagnostics::ToolHelp::{
            CreateToolhelp32Snapshot, MODULEENTRY32W, Module32FirstW, TH32CS_SNAPMODULE,
            TH32CS_SNAPMODULE32,
        };

        // SAFETY: plain Win32 call; the snapshot handle is closed below.
        let snapshot =
            unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid) }
                .map_err(|e| Error::ProcessOpenFailed(format!("module snapshot: {}", e)))?;

        let mut entry = MODULEENTRY32W {
            dwSize: std::mem::size_of::<MODULEENTRY32W>() as u32,
            ..Default::default()
        };

        // SAFETY: `entry` is initialized with its size as the API requires.
        let result = unsafe { Module32FirstW(snapshot, &mut entry) };
        // SAFETY: the snapshot is owned here and not used afterwards.
        unsafe {
            let _ = CloseHandle(snapshot);
        }
        result.map_err(|e| Error::ProcessOpenFailed(format!("main module: {}", e)))?;

        let len = entry
            .szModule
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(entry.szModule.len());
        let name = String::from_utf16_lossy(&entry.szModule[..len]);
        Ok((name, entry.modBaseAddr as u64))
    }

    pub fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;

        let mut buffer = vec![0u8; size];
        let mut bytes_read = 0usize;
        // SAFETY: `buffer` holds `size` writable bytes; the remote address is
        // validated by the kernel.
        unsafe {
            ReadProcessMemory(
                self.handle,
                address as *const _,
                buffer.as_mut_ptr() as *mut _,
                size,
                Some(&mut bytes_read),
            )
        }
        .map_err(|e| Error::MemoryReadFailed {
            address,
            message: e.to_string(),
        })?;

        if bytes_read != size {
            return Err(Error::MemoryReadFailed {
                address,
                message: format!("read {} of {} bytes", bytes_read, size),
            });
        }
        Ok(buffer)
    }

    pub fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()> {
        use windows::Win32::System::Diagnostics::Debug::WriteProcessMemory;

        let mut written = 0usize;
        // SAFETY: `bytes` is a valid slice of `bytes.len()` bytes.
        unsafe {
            WriteProcessMemory(
                self.handle,
                address as *const _,
                bytes.as_ptr() as *const _,
                bytes.len(),
                Some(&mut written),
            )
        }
        .map_err(|e| Error::MemoryWriteFailed {
            address,
            message: e.to_string(),
        })?;

        if written != bytes.len() {
            return Err(Error::MemoryWriteFailed {
                address,
                message: format!("wrote {} of {} bytes", written, bytes.len()),
            });
        }
        Ok(())
    }

    pub fn is_alive(&self) -> bool {
        use windows::Win32::System::Threading::GetExitCodeProcess;

        let mut code = 0u32;
        // SAFETY: `code` is a valid out pointer for the call.
        unsafe { GetExitCodeProcess(self.handle, &mut code) }.is_ok() && code == STILL_ACTIVE
    }
}

// SAFETY: a process handle may be used from any thread; the struct only
// reads the handle value and never frees it outside `drop`.
#[cfg(target_os = "windows")]
unsafe impl Send for ProcessHandle {}
#[cfg(target_os = "windows")]
unsafe impl Sync for ProcessHandle {}

#[cfg(target_os = "windows")]
impl Drop for ProcessHandle {
    fn drop(&mut self) {
        // SAFETY: the handle is owned by this value and closed exactly once.
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

#[cfg(target_os = "linux")]
impl ProcessHandle {
    /// Find a running process by executable name and open it.
    ///
    /// Matches `/proc/<pid>/comm` first, then the first `cmdline` argument
    /// (Wine keeps the Windows path there).
    pub fn find_by_name(name: &str) -> Result<Self> {
        let entries = std::fs::read_dir("/proc")
            .map_err(|e| Error::ProcessOpenFailed(format!("/proc: {}", e)))?;

        for entry in entries.flatten() {
            let Some(pid) = entry
                .file_name()
                .to_str()
                .and_then(|s| s.parse::<u32>().ok())
            else {
                continue;
            };

            let comm = std::fs::read_to_string(entry.path().join("comm")).unwrap_or_default();
            let cmdline = std::fs::read(entry.path().join("cmdline")).unwrap_or_default();
            let first_arg = cmdline.split(|&b| b == 0).next().unwrap_or(&[]);
            let first_arg = String::from_utf8_lossy(first_arg);

            if name_matches(comm.trim(), name) || name_matches(&first_arg, name) {
                return Self::open_image(pid, name);
            }
        }

        Err(Error::ProcessNotFound(name.to_string()))
    }

    /// Open a process by PID with read/write access.
    ///
    /// The image name comes from the first `cmdline` argument; `comm` is
    /// only a fallback because the kernel truncates it.
    pub fn open(pid: u32) -> Result<Self> {
        let cmdline = std::fs::read(format!("/proc/{}/cmdline", pid)).unwrap_or_default();
        let first_arg = cmdline.split(|&b| b == 0).next().unwrap_or(&[]);
        let first_arg = String::from_utf8_lossy(first_arg);
        let image = match first_arg.rsplit(['/', '\\']).next() {
            Some(file) if !file.is_empty() => file.to_string(),
            _ => std::fs::read_to_string(format!("/proc/{}/comm", pid))
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
        };
        Self::open_image(pid, &image)
    }

    /// Open `pid` and take the base address of the mapping named `image`
    fn open_image(pid: u32, image: &str) -> Result<Self> {
        let mem = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(format!("/proc/{}/mem", pid))
            .map_err(|e| Error::ProcessOpenFailed(format!("pid {}: {}", pid, e)))?;

        let maps = std::fs::read_to_string(format!("/proc/{}/maps", pid))
            .map_err(|e| Error::ProcessOpenFailed(format!("pid {} maps: {}", pid, e)))?;
        let base_address = parse_base_address(&maps, image)
            .ok_or_else(|| Error::ProcessOpenFailed(format!("pid {}: no mapped image", pid)))?;

        Ok(Self {
            pid,
            base_address,
            name: image.to_string(),
            mem,
        })
    }

    pub fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        use std::os::unix::fs::FileExt;

        let mut buffer = vec![0u8; size];
        self.mem
            .read_exact_at(&mut buffer, address)
            .map_err(|e| Error::MemoryReadFailed {
                address,
                message: e.to_string(),
            })?;
        Ok(buffer)
    }

    pub fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()> {
        use std::os::unix::fs::FileExt;

        self.mem
            .write_all_at(bytes, address)
            .map_err(|e| Error::MemoryWriteFailed {
                address,
                message: e.to_string(),
            })
    }

    pub fn is_alive(&self) -> bool {
        std::path::Path::new(&format!("/proc/{}", self.pid)).exists()
    }
}

/// Base address of the executable image from a `/proc/<pid>/maps` listing.
///
/// Prefers the first mapping whose path names the image; falls back to the
/// first file-backed mapping. A name of exactly [`COMM_LEN`] bytes may be a
/// truncated `comm` value and also matches as a prefix.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub(crate) fn parse_base_address(maps: &str, image: &str) -> Option<u64> {
    let mut fallback = None;
    for line in maps.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 6 {
            continue;
        }
        let Some((start, _)) = parts[0].split_once('-') else {
            continue;
        };
        let Ok(start) = u64::from_str_radix(start, 16) else {
            continue;
        };
        let path = parts[5..].join(" ");
        if path.starts_with('[') {
            continue;
        }
        if !image.is_empty() && (name_matches(&path, image) || truncated_match(&path, image)) {
            return Some(start);
        }
        fallback.get_or_insert(start);
    }
    fallback
}

/// Longest name the kernel keeps in `/proc/<pid>/comm`
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub(crate) const COMM_LEN: usize = 15;

fn truncated_match(path: &str, image: &str) -> bool {
    if image.len() != COMM_LEN {
        return false;
    }
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    file_name.len() > COMM_LEN
        && file_name
            .get(..COMM_LEN)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(image))
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
impl ProcessHandle {
    pub fn find_by_name(_name: &str) -> Result<Self> {
        Err(Error::ProcessOpenFailed(
            "Process access is only supported on Windows and Linux".to_string(),
        ))
    }

    pub fn open(_pid: u32) -> Result<Self> {
        Err(Error::ProcessOpenFailed(
            "Process access is only supported on Windows and Linux".to_string(),
        ))
    }

    pub fn read_bytes(&self, address: u64, _size: usize) -> Result<Vec<u8>> {
        Err(Error::MemoryReadFailed {
            address,
            message: "unsupported platform".to_string(),
        })
    }

    pub fn write_bytes(&self, address: u64, _bytes: &[u8]) -> Result<()> {
        Err(Error::MemoryWriteFailed {
            address,
            message: "unsupported platform".to_string(),
        })
    }

    pub fn is_alive(&self) -> bool {
        false
    }
}
