#[cfg(all(feature = "web", target_arch = "wasm32"))]
use lazyimg::prelude::*;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
use wasm_bindgen::prelude::*;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
use wasm_bindgen::JsCast;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
use web_sys::{Document, HtmlElement};

#[cfg(all(feature = "web", target_arch = "wasm32"))]
const PHOTO_BASE: &str = "https://picsum.photos/seed";

#[cfg(all(feature = "web", target_arch = "wasm32"))]
#[wasm_bindgen(start)]
pub fn web_init() {
    wasm_logger::init(wasm_logger::Config::new(log::Level::Debug));
    console_error_panic_hook::set_once();
    log::info!("lazyimg web demo starting...");
}

/// A grid of lazily loaded photos. Keep it alive from JS for as long as the
/// page shows the gallery; `free()` detaches every watcher.
#[cfg(all(feature = "web", target_arch = "wasm32"))]
#[wasm_bindgen]
pub struct Gallery {
    lazy: LazyImages<WebPlatform>,
    tiles: Vec<HtmlElement>,
}

#[cfg(all(feature = "web", target_arch = "wasm32"))]
fn create(document: &Document, tag: &str) -> Result<HtmlElement, JsValue> {
    document
        .create_element(tag)?
        .dyn_into::<HtmlElement>()
        .map_err(JsValue::from)
}

#[cfg(all(feature = "web", target_arch = "wasm32"))]
#[wasm_bindgen]
impl Gallery {
    /// Appends `count` tiles to `#container_id`. Every fifth tile is a
    /// background-image `div`, and every seventh points at a missing file to
    /// show the error placeholder.
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str, count: u32, delay_ms: u32) -> Result<Gallery, JsValue> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let container = document
            .get_element_by_id(container_id)
            .ok_or_else(|| JsValue::from_str(&format!("missing #{container_id}")))?;

        let lifecycle = Lifecycle::new()
            .on_loaded(|tile: &HtmlElement| log::debug!("loaded {:?}", tile.get_attribute("src")))
            .on_error(|tile: &HtmlElement| log::warn!("failed {:?}", tile.get_attribute("alt")));
        let lazy = LazyImages::with_options(
            WebPlatform::new(),
            OptionsPatch::new()
                .log(true)
                .log_level(LogLevel::Warn)
                .delay(delay_ms)
                .lifecycle(lifecycle)
                .observer_options(ObserverOptions::new("100px 0px", 0.0)),
        );

        let mut tiles = Vec::with_capacity(count as usize);
        for index in 0..count {
            let background = index % 5 == 4;
            let tile = create(&document, if background { "div" } else { "img" })?;
            tile.set_attribute("alt", &format!("photo {index}"))?;
            tile.style().set_property("width", "320px")?;
            tile.style().set_property("height", "240px")?;
            container.append_child(&tile)?;

            let src = if index % 7 == 6 {
                format!("/missing/{index}.jpg")
            } else {
                format!("{PHOTO_BASE}/{index}/320/240")
            };
            lazy.mount(
                &tile,
                LazyBinding::new(src).srcset(format!("{PHOTO_BASE}/{index}/640/480 2x")),
            );
            tiles.push(tile);
        }
        log::info!("mounted {count} tiles");

        Ok(Gallery { lazy, tiles })
    }

    /// Points every tile at a new seed, as a re-render with fresh data would.
    pub fn reseed(&self, seed: &str) {
        for (index, tile) in self.tiles.iter().enumerate() {
            self.lazy
                .update(tile, format!("{PHOTO_BASE}/{seed}-{index}/320/240"));
        }
    }

    /// Loads every tile right away.
    #[wasm_bindgen(js_name = loadAll)]
    pub fn load_all(&self) {
        for (index, tile) in self.tiles.iter().enumerate() {
            self.lazy
                .force_load(tile, ImageRequest::new(format!("{PHOTO_BASE}/{index}/320/240")));
        }
    }
}

#[cfg(all(feature = "web", target_arch = "wasm32"))]
impl Drop for Gallery {
    fn drop(&mut self) {
        for tile in &self.tiles {
            self.lazy.unmount(tile);
        }
    }
}
