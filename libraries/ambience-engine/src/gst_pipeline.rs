//! GStreamer `playbin3` pipeline
//!
//! URI changes are reported from the playbin's `notify::uri` signal; errors
//! and end-of-stream are read from the pipeline bus on a dedicated thread.
//! Absolute file paths are given to the playbin as `file://` URIs but are
//! reported back unchanged, so callers only ever see their own locators.

use crate::error::PipelineError;
use crate::pipeline::{MediaPipeline, MessageSink, PipelineMessage, SubscriptionId};
use gstreamer as gst;
use gstreamer::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::{debug, warn};

const PIPELINE_NAME: &str = "AmbienceAudioStream";

/// Bus poll interval; bounds how long unsubscribe waits for the bus thread
const BUS_POLL_MS: u64 = 100;

/// Last locator handed to the playbin, with the URI it was set as
type LocatorMap = Arc<Mutex<Option<(String, String)>>>;

struct BusWatch {
    id: SubscriptionId,
    notify: Option<gst::glib::SignalHandlerId>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

/// `playbin3` inside a named pipeline
pub struct GstPipeline {
    pipeline: gst::Pipeline,
    playbin: gst::Element,
    watch: Option<BusWatch>,
    locators: LocatorMap,
    next_subscription: u64,
}

impl GstPipeline {
    /// Initialize GStreamer and build the pipeline
    pub fn new() -> Result<Self, PipelineError> {
        gst::init().map_err(|e| PipelineError::Init(format!("GStreamer init failed: {e}")))?;

        let pipeline = gst::Pipeline::builder().name(PIPELINE_NAME).build();
        let playbin = gst::ElementFactory::make("playbin3")
            .name("source")
            .build()
            .map_err(|e| PipelineError::Init(format!("Failed to create playbin3: {e}")))?;

        pipeline
            .add(&playbin)
            .map_err(|e| PipelineError::Init(format!("Failed to add playbin3: {e}")))?;

        Ok(Self {
            pipeline,
            playbin,
            watch: None,
            locators: Arc::new(Mutex::new(None)),
            next_subscription: 0,
        })
    }

    fn release_watch(&mut self) {
        if let Some(mut watch) = self.watch.take() {
            if let Some(handler) = watch.notify.take() {
                self.playbin.disconnect(handler);
            }
            watch.running.store(false, Ordering::Release);
            if let Some(thread) = watch.thread.take() {
                if thread.join().is_err() {
                    warn!("GStreamer bus thread panicked");
                }
            }
            debug!("Released pipeline subscription {}", watch.id.get());
        }
    }
}

impl MediaPipeline for GstPipeline {
    fn set_uri(&mut self, uri: &str) -> Result<(), PipelineError> {
        let playbin_uri = playbin_uri(uri)?;
        match self.locators.lock() {
            Ok(mut last) => *last = Some((uri.to_string(), playbin_uri.clone())),
            Err(_) => warn!("Locator map poisoned; URI changes report the playbin URI"),
        }
        self.playbin.set_property("uri", playbin_uri.as_str());
        Ok(())
    }

    fn play(&mut self) -> Result<(), PipelineError> {
        self.pipeline
            .set_state(gst::State::Playing)
            .map(|_| ())
            .map_err(|e| PipelineError::StateChange(e.to_string()))
    }

    fn halt(&mut self) -> Result<(), PipelineError> {
        self.pipeline
            .set_state(gst::State::Null)
            .map(|_| ())
            .map_err(|e| PipelineError::StateChange(e.to_string()))
    }

    fn subscribe(&mut self, sink: MessageSink) -> Result<SubscriptionId, PipelineError> {
        // One subscriber at a time
        self.release_watch();

        let bus = self
            .pipeline
            .bus()
            .ok_or_else(|| PipelineError::Subscription("Pipeline has no bus".to_string()))?;

        let running = Arc::new(AtomicBool::new(true));
        let thread = {
            let running = Arc::clone(&running);
            let sink = sink.clone();
            std::thread::Builder::new()
                .name("ambience-gst-bus".to_string())
                .spawn(move || bus_loop(&bus, &sink, &running))
                .map_err(|e| PipelineError::Subscription(e.to_string()))?
        };

        let locators = Arc::clone(&self.locators);
        let notify = self.playbin.connect_notify(Some("uri"), move |element, _| {
            let uri = element.property::<Option<String>>("uri").unwrap_or_default();
            let _ = sink.send(PipelineMessage::UriChanged(reported_locator(&locators, uri)));
        });

        self.next_subscription += 1;
        let id = SubscriptionId::new(self.next_subscription);
        self.watch = Some(BusWatch {
            id,
            notify: Some(notify),
            running,
            thread: Some(thread),
        });
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        if self.watch.as_ref().is_some_and(|watch| watch.id == id) {
            self.release_watch();
        }
    }
}

impl Drop for GstPipeline {
    fn drop(&mut self) {
        self.release_watch();
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}

/// URI to hand the playbin for `locator`
///
/// `playbin3` only accepts URIs, so absolute paths are converted; anything
/// else is already a URI and passes through.
fn playbin_uri(locator: &str) -> Result<String, PipelineError> {
    if !Path::new(locator).is_absolute() {
        return Ok(locator.to_string());
    }
    gst::glib::filename_to_uri(locator, None)
        .map(|uri| uri.to_string())
        .map_err(|e| PipelineError::InvalidUri(format!("{locator}: {e}")))
}

/// Map a URI read back from the playbin to the locator it was set from
fn reported_locator(locators: &LocatorMap, uri: String) -> String {
    let Ok(last) = locators.lock() else {
        return uri;
    };
    match last.as_ref() {
        Some((locator, given)) if *given == uri => locator.clone(),
        _ => uri,
    }
}

fn bus_loop(bus: &gst::Bus, sink: &MessageSink, running: &AtomicBool) {
    while running.load(Ordering::Acquire) {
        let Some(message) = bus.timed_pop_filtered(
            gst::ClockTime::from_mseconds(BUS_POLL_MS),
            &[gst::MessageType::Eos, gst::MessageType::Error],
        ) else {
            continue;
        };

        let forwarded = match message.view() {
            gst::MessageView::Eos(_) => PipelineMessage::EndOfStream,
            gst::MessageView::Error(err) => PipelineMessage::Error(match err.debug() {
                Some(details) => format!("{} ({})", err.error(), details),
                None => err.error().to_string(),
            }),
            _ => continue,
        };

        if sink.send(forwarded).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_paths_become_file_uris() {
        assert_eq!(playbin_uri("/tmp/rain.ogg").unwrap(), "file:///tmp/rain.ogg");
        assert_eq!(
            playbin_uri("/tmp/heavy rain.ogg").unwrap(),
            "file:///tmp/heavy%20rain.ogg"
        );
    }

    #[test]
    fn uris_pass_through_unchanged() {
        assert_eq!(
            playbin_uri("https://radio/waves.mp3").unwrap(),
            "https://radio/waves.mp3"
        );
        assert_eq!(
            playbin_uri("file:///tmp/rain.ogg").unwrap(),
            "file:///tmp/rain.ogg"
        );
    }

    #[test]
    fn converted_uri_is_reported_as_the_original_path() {
        let locators: LocatorMap = Arc::new(Mutex::new(Some((
            "/tmp/rain.ogg".to_string(),
            "file:///tmp/rain.ogg".to_string(),
        ))));

        assert_eq!(
            reported_locator(&locators, "file:///tmp/rain.ogg".to_string()),
            "/tmp/rain.ogg"
        );
        // Anything else is reported as read
        assert_eq!(
            reported_locator(&locators, "https://radio/waves.mp3".to_string()),
            "https://radio/waves.mp3"
        );
    }
}
