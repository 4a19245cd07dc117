use clap::Parser;
use sdl2::audio::AudioSpecDesired;
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::video::FullscreenType;
use std::io::Read;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use ruxn::audio::{self, AUDIO_BUFSIZE, SAMPLE_FREQUENCY};
use ruxn::console::ConsoleType;
use ruxn::input::{self, MouseButton};
use ruxn::keyboard;
use ruxn::recorder::ScreenRecorder;
use ruxn::varvara::Varvara;

const DEFAULT_WIDTH: u16 = 512;
const DEFAULT_HEIGHT: u16 = 320;

#[derive(Parser)]
#[command(name = "ruxn", about = "A Uxn/Varvara virtual machine", version)]
struct Args {
    /// Boot ROM, resolved inside the sandbox (the current directory)
    #[arg(default_value = "boot.rom")]
    rom: String,

    /// Remaining arguments are streamed to the console device
    #[arg(trailing_var_arg = true)]
    rom_args: Vec<String>,

    /// Start with a 2x window
    #[arg(short = '2', long = "2x")]
    zoom2: bool,

    /// Start with a 3x window
    #[arg(short = '3', long = "3x")]
    zoom3: bool,

    /// Start fullscreen
    #[arg(short, long)]
    fullscreen: bool,
}

fn map_mouse(button: sdl2::mouse::MouseButton) -> MouseButton {
    match button {
        sdl2::mouse::MouseButton::Left => MouseButton::LEFT,
        sdl2::mouse::MouseButton::Right => MouseButton::RIGHT,
        sdl2::mouse::MouseButton::Middle => MouseButton::MIDDLE,
        _ => MouseButton::empty(),
    }
}

fn main() -> Result<(), String> {
    let args = Args::parse();
    let mut zoom: u32 = if args.zoom3 {
        3
    } else if args.zoom2 {
        2
    } else {
        1
    };

    let root = std::env::current_dir().map_err(|e| e.to_string())?;
    let mut vm = Varvara::new(root, DEFAULT_WIDTH, DEFAULT_HEIGHT);
    vm.init(&args.rom)?;

    // SDL2 Setup
    let sdl_context = sdl2::init()?;
    let video_subsystem = sdl_context.video()?;
    let audio_subsystem = sdl_context.audio()?;

    let desired_spec = AudioSpecDesired {
        freq: Some(SAMPLE_FREQUENCY),
        channels: Some(2),
        samples: Some(AUDIO_BUFSIZE as u16),
    };
    // A missing audio device is not fatal; the mixer just has no sink.
    let audio_queue = match audio_subsystem.open_queue::<i16, _>(None, &desired_spec) {
        Ok(queue) => {
            queue.resume();
            Some(queue)
        }
        Err(e) => {
            vm.bus.log_string(&format!("[AUDIO] Device unavailable: {}", e));
            None
        }
    };

    let (mut w, mut h) = (vm.bus.screen.w as u32, vm.bus.screen.h as u32);
    let mut window_builder = video_subsystem.window("ruxn", w * zoom, h * zoom);
    window_builder.position_centered();
    if args.fullscreen {
        window_builder.fullscreen_desktop();
    }
    let window = window_builder.build().map_err(|e| e.to_string())?;

    let mut canvas = window.into_canvas().build().map_err(|e| e.to_string())?;
    let texture_creator = canvas.texture_creator();
    let mut texture = texture_creator
        .create_texture_streaming(PixelFormatEnum::RGB24, w, h)
        .map_err(|e| e.to_string())?;

    let mut event_pump = sdl_context.event_pump()?;
    video_subsystem.text_input().start();
    sdl_context.mouse().show_cursor(false);

    // Stdin pump: a thread feeds bytes into a channel drained at the top
    // of each main-loop iteration.
    let (stdin_tx, stdin_rx) = mpsc::channel::<u8>();
    std::thread::spawn(move || {
        let mut stdin = std::io::stdin();
        let mut byte = [0u8; 1];
        loop {
            match stdin.read(&mut byte) {
                Ok(1) => {
                    if stdin_tx.send(byte[0]).is_err() {
                        break;
                    }
                }
                _ => break,
            }
        }
    });

    let mut recorder = ScreenRecorder::new(vm.bus.screen.w, vm.bus.screen.h, 30);

    // Run the init vector, then hand the CLI arguments to the ROM.
    vm.start(&args.rom_args);

    let frame_interval = Duration::from_nanos(1_000_000_000 / 60);
    let mut next_refresh = Instant::now();

    'running: loop {
        if vm.halted() {
            vm.bus.log_string("[SYSTEM] Halted.");
            break 'running;
        }

        while let Ok(b) = stdin_rx.try_recv() {
            vm.console_input(b, ConsoleType::Stdin);
        }

        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => break 'running,
                Event::Window { win_event: WindowEvent::Exposed, .. } => {
                    vm.bus.screen.force_redraw();
                }
                Event::MouseMotion { x, y, .. } => {
                    let sx = (x.max(0) as u32 / zoom).min(w.saturating_sub(1)) as u16;
                    let sy = (y.max(0) as u32 / zoom).min(h.saturating_sub(1)) as u16;
                    input::mouse_move(&mut vm, sx, sy);
                }
                Event::MouseButtonDown { mouse_btn, .. } => {
                    input::mouse_down(&mut vm, map_mouse(mouse_btn));
                }
                Event::MouseButtonUp { mouse_btn, .. } => {
                    input::mouse_up(&mut vm, map_mouse(mouse_btn));
                }
                Event::MouseWheel { x, y, .. } => {
                    input::mouse_scroll(&mut vm, x as u16, y as u16);
                }
                Event::TextInput { text, .. } => {
                    for b in text.bytes() {
                        input::key_down(&mut vm, b);
                        input::key_up(&mut vm, b);
                    }
                }
                Event::KeyDown { keycode: Some(keycode), keymod, .. } => match keycode {
                    Keycode::F1 => {
                        zoom = if zoom == 3 { 1 } else { zoom + 1 };
                        let _ = canvas.window_mut().set_size(w * zoom, h * zoom);
                    }
                    Keycode::F2 => {
                        vm.uxn.dev[0x0e] ^= 1;
                        vm.bus.screen.force_redraw();
                    }
                    Keycode::F3 => recorder.toggle(),
                    Keycode::F4 => vm.reset(false),
                    Keycode::F5 => vm.reset(true),
                    Keycode::F11 => {
                        let state = if canvas.window().fullscreen_state() == FullscreenType::Off {
                            FullscreenType::Desktop
                        } else {
                            FullscreenType::Off
                        };
                        let _ = canvas.window_mut().set_fullscreen(state);
                    }
                    _ => {
                        let button = keyboard::map_button(keycode);
                        if !button.is_empty() {
                            input::button_down(&mut vm, button, 0);
                        } else if let Some(c) = keyboard::map_char(keycode, keymod) {
                            input::key_down(&mut vm, c);
                        }
                    }
                },
                Event::KeyUp { keycode: Some(keycode), keymod, .. } => {
                    let button = keyboard::map_button(keycode);
                    if !button.is_empty() {
                        input::button_up(&mut vm, button, 0);
                    } else if let Some(c) = keyboard::map_char(keycode, keymod) {
                        input::key_up(&mut vm, c);
                    }
                }
                _ => {}
            }
        }

        let now = Instant::now();
        if now >= next_refresh {
            next_refresh = now + frame_interval;
            vm.frame();

            // The ROM may have resized the screen; rebuild the texture.
            if vm.bus.screen.take_resized() {
                w = vm.bus.screen.w as u32;
                h = vm.bus.screen.h as u32;
                texture = texture_creator
                    .create_texture_streaming(PixelFormatEnum::RGB24, w, h)
                    .map_err(|e| e.to_string())?;
                let _ = canvas.window_mut().set_size(w * zoom, h * zoom);
                recorder = ScreenRecorder::new(w as u16, h as u16, 30);
            }

            let row_bytes = w as usize * 3;
            texture.with_lock(None, |buffer: &mut [u8], pitch: usize| {
                for (row, chunk) in vm.bus.screen.pixels.chunks_exact(row_bytes).enumerate() {
                    buffer[row * pitch..row * pitch + row_bytes].copy_from_slice(chunk);
                }
            })?;
            canvas.copy(&texture, None, None)?;
            canvas.present();

            recorder.capture(&vm.bus.screen.pixels);
        }

        if let Some(queue) = &audio_queue {
            audio::pump(&mut vm, queue);
        }

        let now = Instant::now();
        if next_refresh > now {
            std::thread::sleep(next_refresh - now);
        }
    }

    vm.bus.console.flush();
    Ok(())
}
