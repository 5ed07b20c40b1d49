//! Burst Capture Example
//!
//! This example drives an image source pad with a fake camera that
//! produces a burst of JPEG frames, and consumes them from a channel sink.
//!
//! # Running
//!
//! ```bash
//! cargo run --example burst
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use stillsrc_caps::{Caps, Fraction, Structure, ValueSet, JPEG};
use stillsrc_pad::{
    CapabilityProvider, ChannelSink, FrameBuffer, ImgSrcConfig, ImgSrcPad, PadEvent, Result, SinkItem, TagExtractor,
    TagList, TagValue,
};

/// Camera that captures up to 4096x3072 at 15 or 30 fps
struct FakeCamera;

impl CapabilityProvider for FakeCamera {
    fn capture_caps(&self) -> Caps {
        Caps::from_structure(
            Structure::new(JPEG)
                .with_width(ValueSet::range(320, 4096))
                .with_height(ValueSet::range(240, 3072))
                .with_framerate(ValueSet::List(vec![
                    Fraction::from_integer(15),
                    Fraction::from_integer(30),
                ])),
        )
    }

    fn set_capture_size(&self, width: u32, height: u32) {
        println!("Camera capture size: {width}x{height}");
    }

    fn commit_parameters(&self) -> Result<()> {
        println!("Camera parameters committed");
        Ok(())
    }
}

/// Reports the payload size as a tag
struct SizeTags;

impl TagExtractor for SizeTags {
    fn extract(&self, buffer: &FrameBuffer) -> Option<TagList> {
        let size = i64::try_from(buffer.len()).ok()?;
        Some(TagList::new().with("image-size", TagValue::Int(size)))
    }
}

fn fake_jpeg(index: u8) -> Vec<u8> {
    let mut data = vec![0xff, 0xd8];
    data.extend(std::iter::repeat(index).take(64));
    data.extend([0xff, 0xd9]);
    data
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("stillsrc-pad Burst Example");
    println!("==========================");

    let config = ImgSrcConfig::builder().default_width(1600).default_height(1200).build();

    println!("Configuration:");
    println!("  Default size: {}x{}", config.default_width, config.default_height);
    println!("  Default fps: {}", config.default_fps);
    println!("  Template caps: {}", config.template_caps);

    let pad = Arc::new(
        ImgSrcPad::builder(config)
            .provider(Arc::new(FakeCamera))
            .tags(Arc::new(SizeTags))
            .build()?,
    );
    let mut messages = pad.take_message_receiver().ok_or("message receiver taken")?;

    // Consumer accepts 1080p or smaller
    let (sink, mut rx) = ChannelSink::new(4);
    let sink = sink.with_caps(Caps::from_structure(
        Structure::new(JPEG)
            .with_width(ValueSet::range(1, 1920))
            .with_height(ValueSet::range(1, 1080)),
    ));
    pad.link(Arc::new(sink));

    pad.activate(true)?;
    if let Some(format) = pad.negotiated_format() {
        println!("\nNegotiated: {format}");
    }

    // Capture side
    let producer = {
        let pad = Arc::clone(&pad);
        thread::spawn(move || {
            for index in 0..5 {
                pad.enqueue(FrameBuffer::new(fake_jpeg(index)));
                thread::sleep(Duration::from_millis(10));
            }
        })
    };

    let mut frames = 0;
    while frames < 5 {
        match rx.recv().await {
            Some(SinkItem::Buffer(frame)) => {
                frames += 1;
                println!(
                    "Frame {}: {} bytes, pts {:?}, tags: {}",
                    frame.offset().unwrap_or_default(),
                    frame.len(),
                    frame.pts(),
                    frame.tags().map(ToString::to_string).unwrap_or_default()
                );
            }
            Some(SinkItem::Event(PadEvent::Segment(segment))) => println!("Segment from {:?}", segment.start),
            Some(SinkItem::Event(_)) => {}
            None => break,
        }
    }

    producer.join().map_err(|_| "producer panicked")?;

    let control = Arc::clone(&pad);
    tokio::task::spawn_blocking(move || control.activate(false)).await??;

    println!("\nStats: {:?}", pad.stats());
    while let Ok(message) = messages.try_recv() {
        println!("Message: {message:?}");
    }

    Ok(())
}
