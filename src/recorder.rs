use chrono::Local;
use gif::{Encoder, Frame, Repeat};
use std::fs::File;
use std::io::BufWriter;
use std::time::{Duration, Instant};

/// Captures the screen's RGB24 buffer into an animated GIF.
pub struct ScreenRecorder {
    is_recording: bool,
    width: u16,
    height: u16,
    encoder: Option<Encoder<BufWriter<File>>>,
    last_frame_time: Instant,
    frame_delay: Duration,
}

impl ScreenRecorder {
    pub fn new(width: u16, height: u16, fps: u64) -> Self {
        Self {
            is_recording: false,
            width,
            height,
            encoder: None,
            last_frame_time: Instant::now(),
            frame_delay: Duration::from_millis(1000 / fps),
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_recording
    }

    pub fn toggle(&mut self) {
        if self.is_recording {
            self.stop();
        } else {
            self.start();
        }
    }

    fn start(&mut self) {
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let filename = format!("ruxn_capture_{}.gif", timestamp);

        println!("[RECORDER] Started recording to {}", filename);

        let file = match File::create(&filename) {
            Ok(f) => f,
            Err(e) => {
                println!("[RECORDER] Could not create {}: {}", filename, e);
                return;
            }
        };
        let writer = BufWriter::new(file);

        let mut encoder = match Encoder::new(writer, self.width, self.height, &[]) {
            Ok(enc) => enc,
            Err(e) => {
                println!("[RECORDER] Could not start encoder: {}", e);
                return;
            }
        };
        let _ = encoder.set_repeat(Repeat::Infinite);

        self.encoder = Some(encoder);
        self.is_recording = true;
        self.last_frame_time = Instant::now();
    }

    fn stop(&mut self) {
        println!("[RECORDER] Stopped recording.");
        // Dropping the encoder flushes and writes the file trailer
        self.encoder = None;
        self.is_recording = false;
    }

    pub fn capture(&mut self, pixels: &[u8]) {
        if !self.is_recording {
            return;
        }
        if pixels.len() != self.width as usize * self.height as usize * 3 {
            // The ROM resized the screen mid-recording; end the clip.
            self.stop();
            return;
        }
        if self.last_frame_time.elapsed() >= self.frame_delay {
            if let Some(enc) = &mut self.encoder {
                let mut frame = Frame::from_rgb(self.width, self.height, pixels);
                // Delay is in units of 10ms
                frame.delay = (self.frame_delay.as_millis() / 10) as u16;
                if let Err(e) = enc.write_frame(&frame) {
                    println!("[RECORDER] Error writing frame: {}", e);
                }
            }
            self.last_frame_time = Instant::now();
        }
    }
}
