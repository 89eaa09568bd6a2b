use super::DeviceStatus;

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        for f in preferred {
            if caps.formats.contains(&f) {
                return Some(f);
            }
        }
    }

    Some(caps.formats[0])
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// FIFO under vsync; otherwise the first uncapped mode the surface offers.
pub(crate) fn choose_present_mode(
    caps: &wgpu::SurfaceCapabilities,
    vsync: bool,
) -> wgpu::PresentMode {
    if vsync {
        return wgpu::PresentMode::Fifo;
    }

    [wgpu::PresentMode::Mailbox, wgpu::PresentMode::Immediate]
        .into_iter()
        .find(|m| caps.present_modes.contains(m))
        .unwrap_or(wgpu::PresentMode::Fifo)
}

/// Maps a frame acquisition failure onto the device-status vocabulary.
///
/// Lost and outdated surfaces are rebuildable right away; timeouts mean the
/// presentation engine is unavailable for now.
pub(crate) fn status_for(err: &wgpu::SurfaceError) -> DeviceStatus {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => DeviceStatus::NotReset,
        wgpu::SurfaceError::OutOfMemory => DeviceStatus::DriverInternalError,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => DeviceStatus::Lost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_errors_map_to_statuses() {
        assert_eq!(status_for(&wgpu::SurfaceError::Outdated), DeviceStatus::NotReset);
        assert_eq!(status_for(&wgpu::SurfaceError::Lost), DeviceStatus::NotReset);
        assert_eq!(status_for(&wgpu::SurfaceError::Timeout), DeviceStatus::Lost);
        assert_eq!(
            status_for(&wgpu::SurfaceError::OutOfMemory),
            DeviceStatus::DriverInternalError
        );
    }

    #[test]
    fn alpha_mode_falls_back_to_first_supported() {
        let caps = wgpu::SurfaceCapabilities {
            formats: vec![wgpu::TextureFormat::Rgba8Unorm],
            present_modes: vec![wgpu::PresentMode::Fifo],
            alpha_modes: vec![wgpu::CompositeAlphaMode::PreMultiplied],
            usages: wgpu::TextureUsages::RENDER_ATTACHMENT,
        };
        assert_eq!(
            choose_alpha_mode(&caps, Some(wgpu::CompositeAlphaMode::Opaque)),
            wgpu::CompositeAlphaMode::PreMultiplied
        );
        assert_eq!(choose_surface_format(&caps, true), Some(wgpu::TextureFormat::Rgba8Unorm));
        assert_eq!(choose_present_mode(&caps, false), wgpu::PresentMode::Fifo);
    }
}
