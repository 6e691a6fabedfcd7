use std::ffi::c_void;
use std::ptr;

use super::{IntrospectError, Introspector};
use crate::memory::PhysAddr;
use crate::target::DomainId;
use crate::util::PAGE_SIZE;

#[allow(
    non_upper_case_globals,
    non_camel_case_types,
    non_snake_case,
    dead_code,
    clippy::all
)]
mod ffi {
    include!(concat!(env!("OUT_DIR"), "/libvmi_bindings.rs"));
}

/// A LibVMI session on a live domain.
///
/// The session is initialized without OS-level introspection, so only
/// physical memory access is available. It is destroyed on drop.
pub struct VmiSession {
    vmi: ffi::vmi_instance_t,
    domain: DomainId,
    memsize: u64,
    scratch: Box<[u8]>,
}

fn init_error_reason(error: ffi::vmi_init_error_t) -> &'static str {
    match error {
        ffi::VMI_INIT_ERROR_DRIVER_NOT_DETECTED => "no hypervisor driver detected",
        ffi::VMI_INIT_ERROR_DRIVER => "hypervisor driver failed to initialize",
        ffi::VMI_INIT_ERROR_VM_NOT_FOUND => "domain not found",
        ffi::VMI_INIT_ERROR_PAGING => "paging initialization failed",
        ffi::VMI_INIT_ERROR_NO_CONFIG => "no config found",
        ffi::VMI_INIT_ERROR_NO_CONFIG_ENTRY => "no config entry for domain",
        _ => "unknown error",
    }
}

impl VmiSession {
    pub fn init(domain: DomainId) -> Result<Self, IntrospectError> {
        let id = u64::from(domain.as_u32());
        let domain_ptr = &id as *const u64 as *const c_void;
        let init_flags = u64::from(ffi::VMI_INIT_DOMAINID);
        let init_failed = |reason: &str| IntrospectError::Init {
            domain: domain.to_string(),
            reason: reason.to_string(),
        };

        let mut mode: ffi::vmi_mode_t = 0;
        let status = unsafe {
            ffi::vmi_get_access_mode(
                ptr::null_mut(),
                domain_ptr,
                init_flags,
                ptr::null_mut(),
                &mut mode,
            )
        };
        if status != ffi::VMI_SUCCESS {
            return Err(init_failed("failed to detect access mode"));
        }

        let mut vmi: ffi::vmi_instance_t = ptr::null_mut();
        let mut error: ffi::vmi_init_error_t = ffi::VMI_INIT_ERROR_NONE;
        let status = unsafe {
            ffi::vmi_init(
                &mut vmi,
                mode,
                domain_ptr,
                init_flags,
                ptr::null_mut(),
                &mut error,
            )
        };
        if status != ffi::VMI_SUCCESS {
            // vmi_init cleans up after itself on failure
            return Err(init_failed(init_error_reason(error)));
        }

        let memsize = unsafe { ffi::vmi_get_memsize(vmi) };
        info!(
            "initialized LibVMI session for domain {} (mode {}, {} bytes of memory)",
            domain, mode, memsize
        );
        Ok(VmiSession {
            vmi,
            domain,
            memsize,
            scratch: vec![0u8; PAGE_SIZE].into_boxed_slice(),
        })
    }
}

impl Introspector for VmiSession {
    type Page<'a> = &'a [u8];

    fn memsize(&self) -> u64 {
        self.memsize
    }

    fn access_page(&mut self, addr: PhysAddr) -> Option<Self::Page<'_>> {
        let mut bytes_read: usize = 0;
        let status = unsafe {
            ffi::vmi_read_pa(
                self.vmi,
                addr.as_u64(),
                self.scratch.len(),
                self.scratch.as_mut_ptr() as *mut c_void,
                &mut bytes_read,
            )
        };
        if status != ffi::VMI_SUCCESS || bytes_read != self.scratch.len() {
            trace!("vmi_read_pa({}) read {} bytes", addr, bytes_read);
            return None;
        }
        Some(&self.scratch[..])
    }

    fn pause(&mut self) -> Result<(), IntrospectError> {
        match unsafe { ffi::vmi_pause_vm(self.vmi) } {
            ffi::VMI_SUCCESS => Ok(()),
            _ => Err(IntrospectError::Pause),
        }
    }

    fn resume(&mut self) -> Result<(), IntrospectError> {
        match unsafe { ffi::vmi_resume_vm(self.vmi) } {
            ffi::VMI_SUCCESS => Ok(()),
            _ => Err(IntrospectError::Resume),
        }
    }
}

impl Drop for VmiSession {
    fn drop(&mut self) {
        if unsafe { ffi::vmi_destroy(self.vmi) } != ffi::VMI_SUCCESS {
            warn!("vmi_destroy failed for domain {}", self.domain);
        } else {
            debug!("destroyed LibVMI session for domain {}", self.domain);
        }
    }
}
