//! OV2640 camera on the AI-Thinker ESP32-CAM.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: wraps the `esp32-camera` component (bindings generated into
//! `esp_idf_sys::camera`).  Each capture copies the driver's frame
//! buffer into an owned [`Frame`] and hands the buffer straight back, so
//! the single PSRAM buffer is never held across an upload.
//!
//! On host/test: produces small deterministic JPEG-framed payloads.

use log::info;

use crate::config::{CameraConfig, FrameSize};
use crate::error::CameraError;

/// JPEG start-of-image marker.
pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
/// JPEG end-of-image marker.
pub const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// One encoded still image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub jpeg: Vec<u8>,
    pub width: u16,
    pub height: u16,
}

impl Frame {
    pub fn is_jpeg(&self) -> bool {
        self.jpeg.starts_with(&JPEG_SOI)
    }
}

pub struct CameraDriver {
    frame_size: FrameSize,
    captures: u32,
}

impl CameraDriver {
    /// Power up the sensor and allocate the frame buffer.
    #[cfg(target_os = "espidf")]
    pub fn init(cfg: &CameraConfig) -> Result<Self, CameraError> {
        use esp_idf_sys::camera;

        use crate::pins;

        let frame_size = match cfg.frame_size {
            FrameSize::Qvga => camera::framesize_t_FRAMESIZE_QVGA,
            FrameSize::Vga => camera::framesize_t_FRAMESIZE_VGA,
            FrameSize::Svga => camera::framesize_t_FRAMESIZE_SVGA,
            FrameSize::Xga => camera::framesize_t_FRAMESIZE_XGA,
        };

        let config = camera::camera_config_t {
            pin_pwdn: pins::CAM_PWDN,
            pin_reset: pins::CAM_RESET,
            pin_xclk: pins::CAM_XCLK,
            __bindgen_anon_1: camera::camera_config_t__bindgen_ty_1 {
                pin_sccb_sda: pins::CAM_SIOD,
            },
            __bindgen_anon_2: camera::camera_config_t__bindgen_ty_2 {
                pin_sccb_scl: pins::CAM_SIOC,
            },
            pin_d7: pins::CAM_Y9,
            pin_d6: pins::CAM_Y8,
            pin_d5: pins::CAM_Y7,
            pin_d4: pins::CAM_Y6,
            pin_d3: pins::CAM_Y5,
            pin_d2: pins::CAM_Y4,
            pin_d1: pins::CAM_Y3,
            pin_d0: pins::CAM_Y2,
            pin_vsync: pins::CAM_VSYNC,
            pin_href: pins::CAM_HREF,
            pin_pclk: pins::CAM_PCLK,
            xclk_freq_hz: pins::CAM_XCLK_FREQ_HZ,
            ledc_timer: esp_idf_sys::ledc_timer_t_LEDC_TIMER_0,
            ledc_channel: esp_idf_sys::ledc_channel_t_LEDC_CHANNEL_0,
            pixel_format: camera::pixformat_t_PIXFORMAT_JPEG,
            frame_size,
            jpeg_quality: i32::from(cfg.jpeg_quality),
            fb_count: 1,
            fb_location: camera::camera_fb_location_t_CAMERA_FB_IN_PSRAM,
            grab_mode: camera::camera_grab_mode_t_CAMERA_GRAB_LATEST,
            ..Default::default()
        };

        let err = unsafe { camera::esp_camera_init(&config) };
        if err != esp_idf_sys::ESP_OK {
            return Err(CameraError::InitFailed(err));
        }
        info!("Camera: OV2640 ready ({:?}, q={})", cfg.frame_size, cfg.jpeg_quality);
        Ok(Self { frame_size: cfg.frame_size, captures: 0 })
    }

    /// Simulation: nothing to power up.
    #[cfg(not(target_os = "espidf"))]
    pub fn init(cfg: &CameraConfig) -> Result<Self, CameraError> {
        info!("Camera(sim): {:?} q={}", cfg.frame_size, cfg.jpeg_quality);
        Ok(Self { frame_size: cfg.frame_size, captures: 0 })
    }

    #[cfg(target_os = "espidf")]
    pub fn capture(&mut self) -> Result<Frame, CameraError> {
        use esp_idf_sys::camera;

        let fb = unsafe { camera::esp_camera_fb_get() };
        if fb.is_null() {
            return Err(CameraError::CaptureFailed);
        }
        // SAFETY: the driver owns `fb` until `esp_camera_fb_return`; the
        // slice is copied out before the buffer is returned.
        let frame = unsafe {
            let fb_ref = &*fb;
            let data = core::slice::from_raw_parts(fb_ref.buf, fb_ref.len);
            Frame {
                jpeg: data.to_vec(),
                width: fb_ref.width as u16,
                height: fb_ref.height as u16,
            }
        };
        unsafe { camera::esp_camera_fb_return(fb) };

        self.finish(frame)
    }

    /// Simulation: an SOI marker, a counter-tagged body, and an EOI marker.
    #[cfg(not(target_os = "espidf"))]
    pub fn capture(&mut self) -> Result<Frame, CameraError> {
        let (width, height) = self.frame_size.dimensions();
        let mut jpeg = Vec::with_capacity(16);
        jpeg.extend_from_slice(&JPEG_SOI);
        jpeg.extend_from_slice(&self.captures.to_be_bytes());
        jpeg.extend_from_slice(&width.to_be_bytes());
        jpeg.extend_from_slice(&height.to_be_bytes());
        jpeg.extend_from_slice(&JPEG_EOI);
        self.finish(Frame { jpeg, width, height })
    }

    fn finish(&mut self, frame: Frame) -> Result<Frame, CameraError> {
        if !frame.is_jpeg() {
            return Err(CameraError::NotJpeg);
        }
        self.captures = self.captures.wrapping_add(1);
        Ok(frame)
    }

    pub fn captures(&self) -> u32 {
        self.captures
    }
}
