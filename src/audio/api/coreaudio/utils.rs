use std::ffi::{c_void, CStr};
use std::mem;
use std::ptr;

use anyhow::{anyhow, Result};
use coreaudio_sys::{
    kAudioDevicePermissionsError, kAudioDeviceUnsupportedFormatError,
    kAudioHardwareBadDeviceError, kAudioHardwareBadObjectError,
    kAudioHardwareBadPropertySizeError, kAudioHardwareBadStreamError,
    kAudioHardwareIllegalOperationError, kAudioHardwareNotRunningError,
    kAudioHardwareUnknownPropertyError, kAudioHardwareUnspecifiedError,
    kAudioHardwareUnsupportedOperationError, AudioObjectGetPropertyData,
    AudioObjectGetPropertyDataSize, AudioObjectHasProperty, AudioObjectID,
    AudioObjectIsPropertySettable, AudioObjectPropertyAddress, AudioObjectPropertyElement,
    AudioObjectPropertyScope, AudioObjectPropertySelector, AudioObjectSetPropertyData, Boolean,
    OSStatus,
};

/// `kAudioObjectPropertyElementMain`, spelled out since older SDKs only know it as `...Master`.
pub(super) const ELEMENT_MAIN: AudioObjectPropertyElement = 0;

const HOST_ERRORS: &[(OSStatus, &str)] = &[
    (kAudioHardwareNotRunningError as OSStatus, "kAudioHardwareNotRunningError"),
    (kAudioHardwareUnspecifiedError as OSStatus, "kAudioHardwareUnspecifiedError"),
    (kAudioHardwareUnknownPropertyError as OSStatus, "kAudioHardwareUnknownPropertyError"),
    (kAudioHardwareBadPropertySizeError as OSStatus, "kAudioHardwareBadPropertySizeError"),
    (kAudioHardwareIllegalOperationError as OSStatus, "kAudioHardwareIllegalOperationError"),
    (kAudioHardwareBadObjectError as OSStatus, "kAudioHardwareBadObjectError"),
    (kAudioHardwareBadDeviceError as OSStatus, "kAudioHardwareBadDeviceError"),
    (kAudioHardwareBadStreamError as OSStatus, "kAudioHardwareBadStreamError"),
    (kAudioHardwareUnsupportedOperationError as OSStatus, "kAudioHardwareUnsupportedOperationError"),
    (kAudioDeviceUnsupportedFormatError as OSStatus, "kAudioDeviceUnsupportedFormatError"),
    (kAudioDevicePermissionsError as OSStatus, "kAudioDevicePermissionsError"),
];

#[inline(always)]
pub(super) fn host_error(status: OSStatus) -> &'static str {
    HOST_ERRORS
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, name)| *name)
        .unwrap_or("Unknown error")
}

#[inline(always)]
fn check(status: OSStatus, object: AudioObjectID, address: &AudioObjectPropertyAddress) -> Result<()> {
    if status == 0 {
        return Ok(());
    }
    Err(anyhow!(
        "property {:#x} on audio object {} failed: {} ({})",
        address.mSelector,
        object,
        host_error(status),
        status
    ))
}

pub(super) fn address(
    selector: AudioObjectPropertySelector,
    scope: AudioObjectPropertyScope,
    element: AudioObjectPropertyElement,
) -> AudioObjectPropertyAddress {
    AudioObjectPropertyAddress {
        mSelector: selector,
        mScope: scope,
        mElement: element,
    }
}

pub(super) fn has_property(object: AudioObjectID, address: &AudioObjectPropertyAddress) -> bool {
    unsafe { AudioObjectHasProperty(object, address) != 0 }
}

pub(super) fn is_settable(object: AudioObjectID, address: &AudioObjectPropertyAddress) -> Result<bool> {
    let mut settable: Boolean = 0;
    let status = unsafe { AudioObjectIsPropertySettable(object, address, &mut settable) };
    check(status, object, address)?;
    Ok(settable != 0)
}

pub(super) fn get_property<T: Default>(
    object: AudioObjectID,
    address: &AudioObjectPropertyAddress,
) -> Result<T> {
    let mut value = T::default();
    let mut size = mem::size_of::<T>() as u32;
    let status = unsafe {
        AudioObjectGetPropertyData(
            object,
            address,
            0,
            ptr::null(),
            &mut size,
            &mut value as *mut T as *mut c_void,
        )
    };
    check(status, object, address)?;
    Ok(value)
}

pub(super) fn get_property_size(
    object: AudioObjectID,
    address: &AudioObjectPropertyAddress,
) -> Result<usize> {
    let mut size = 0u32;
    let status =
        unsafe { AudioObjectGetPropertyDataSize(object, address, 0, ptr::null(), &mut size) };
    check(status, object, address)?;
    Ok(size as usize)
}

pub(super) fn get_property_array<T: Default + Clone>(
    object: AudioObjectID,
    address: &AudioObjectPropertyAddress,
) -> Result<Vec<T>> {
    let element_size = mem::size_of::<T>();
    let count = get_property_size(object, address)? / element_size;
    if count == 0 {
        return Ok(Vec::new());
    }
    let mut values = vec![T::default(); count];
    let mut size = (count * element_size) as u32;
    let status = unsafe {
        AudioObjectGetPropertyData(
            object,
            address,
            0,
            ptr::null(),
            &mut size,
            values.as_mut_ptr() as *mut c_void,
        )
    };
    check(status, object, address)?;
    // the list may have shrunk between the two calls
    values.truncate(size as usize / element_size);
    Ok(values)
}

pub(super) fn get_property_string(
    object: AudioObjectID,
    address: &AudioObjectPropertyAddress,
) -> Result<String> {
    let mut bytes = get_property_array::<u8>(object, address)?;
    if !bytes.contains(&0) {
        bytes.push(0);
    }
    let name = CStr::from_bytes_until_nul(&bytes)?;
    Ok(name.to_string_lossy().into_owned())
}

pub(super) fn set_property<T>(
    object: AudioObjectID,
    address: &AudioObjectPropertyAddress,
    value: &T,
) -> Result<()> {
    let status = unsafe {
        AudioObjectSetPropertyData(
            object,
            address,
            0,
            ptr::null(),
            mem::size_of::<T>() as u32,
            value as *const T as *const c_void,
        )
    };
    check(status, object, address)
}
