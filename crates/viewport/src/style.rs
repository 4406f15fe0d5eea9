use tracing::{debug, trace, warn};

use crate::config::StyleManifest;
use crate::renderer::{MapRenderer, RendererError};

/// Version token of the renderer's loaded style. Every style (re)load
/// wipes registered sources and layers and must advance the generation.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StyleGeneration(pub u64);

impl StyleGeneration {
    pub fn next(self) -> Self {
        StyleGeneration(self.0.wrapping_add(1))
    }
}

/// Keeps the manifest's sources and layers attached, once per style generation.
#[derive(Debug, Default)]
pub struct StyleAttachment {
    attached: Option<StyleGeneration>,
}

impl StyleAttachment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation the manifest was last attached for.
    pub fn attached_generation(&self) -> Option<StyleGeneration> {
        self.attached
    }

    pub fn is_attached(&self, generation: StyleGeneration) -> bool {
        self.attached == Some(generation)
    }

    /// Ensures the manifest is attached for `generation`.
    ///
    /// Returns `true` when sources and layers are present and safe to use.
    /// Not-ready is a no-op returning `false`; the caller retries on the next
    /// readiness signal. A renderer failure also returns `false` and leaves
    /// the record untouched so the next signal retries.
    pub fn ensure_attached<R: MapRenderer>(
        &mut self,
        map: &mut R,
        style_ready: bool,
        generation: StyleGeneration,
        manifest: &StyleManifest,
    ) -> bool {
        if !style_ready {
            trace!(generation = generation.0, "style not ready, attachment deferred");
            return false;
        }
        if self.attached == Some(generation) {
            return true;
        }

        match register(map, manifest) {
            Ok(()) => {
                debug!(generation = generation.0, "attached style sources and layers");
                self.attached = Some(generation);
                true
            }
            Err(err) => {
                warn!(generation = generation.0, "style attachment failed: {err}");
                false
            }
        }
    }
}

fn register<R: MapRenderer>(map: &mut R, manifest: &StyleManifest) -> Result<(), RendererError> {
    // Existing ids survive from a partial earlier attempt or from a style
    // that was not actually reset; only create what is missing.
    for source in &manifest.sources {
        if !map.has_source(&source.id) {
            map.add_source(source)?;
        }
    }
    for layer in &manifest.layers {
        if !map.has_layer(&layer.id) {
            map.add_layer(layer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{StyleAttachment, StyleGeneration};
    use crate::config::StyleManifest;
    use crate::sim::{SimCall, SimRenderer};

    fn registrations(map: &SimRenderer) -> usize {
        map.calls()
            .iter()
            .filter(|c| matches!(c, SimCall::AddSource(_) | SimCall::AddLayer(_)))
            .count()
    }

    #[test]
    fn not_ready_is_a_no_op() {
        let mut map = SimRenderer::new();
        let mut attachment = StyleAttachment::new();
        let manifest = StyleManifest::default();

        assert!(!attachment.ensure_attached(&mut map, false, StyleGeneration(0), &manifest));
        assert!(map.calls().is_empty());
        assert_eq!(attachment.attached_generation(), None);
    }

    #[test]
    fn attaches_once_per_generation() {
        let mut map = SimRenderer::new();
        let mut attachment = StyleAttachment::new();
        let manifest = StyleManifest::default();
        let per_attach = manifest.sources.len() + manifest.layers.len();

        for _ in 0..5 {
            assert!(attachment.ensure_attached(&mut map, true, StyleGeneration(1), &manifest));
        }
        assert_eq!(registrations(&map), per_attach);

        map.reload_style();
        for _ in 0..3 {
            assert!(attachment.ensure_attached(&mut map, true, StyleGeneration(2), &manifest));
        }
        assert_eq!(registrations(&map), per_attach * 2);
        assert_eq!(attachment.attached_generation(), Some(StyleGeneration(2)));
    }

    #[test]
    fn skips_ids_that_survived_the_bump() {
        let mut map = SimRenderer::new();
        let mut attachment = StyleAttachment::new();
        let manifest = StyleManifest::default();

        attachment.ensure_attached(&mut map, true, StyleGeneration(0), &manifest);
        // Generation advanced without the renderer actually clearing its tables.
        assert!(attachment.ensure_attached(&mut map, true, StyleGeneration(1), &manifest));
        assert_eq!(
            registrations(&map),
            manifest.sources.len() + manifest.layers.len()
        );
    }

    #[test]
    fn failed_registration_retries_on_next_signal() {
        let mut map = SimRenderer::new();
        let mut attachment = StyleAttachment::new();
        let manifest = StyleManifest::default();

        map.fail_next_add_layer();
        assert!(!attachment.ensure_attached(&mut map, true, StyleGeneration(0), &manifest));
        assert_eq!(attachment.attached_generation(), None);

        assert!(attachment.ensure_attached(&mut map, true, StyleGeneration(0), &manifest));
        assert!(map.has_all(&manifest));
    }
}
