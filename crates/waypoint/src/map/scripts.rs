//! In-page scripts for the map store and the 3D scene.
//!
//! Each script is a single expression opening with a `/*tag*/` comment that
//! names it in logs and in the mock surface. Scripts throw while the store or
//! a ref is not populated yet; callers retry.

use super::LngLat;

/// Scene-graph library injected when the page does not ship one
pub const SCENE_LIBRARY_URL: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/three.js/r128/three.min.js";

/// Name of the sprites marking editable boundary vertices
pub const VERTEX_SPRITE_NAME: &str = "EditableVertexSprite";

const STORE: &str = "const store = window.__DEV_GET_ZUSTAND_STORE_MAP \
    && window.__DEV_GET_ZUSTAND_STORE_MAP().getState(); \
    if (!store) throw new Error('map store unavailable');";

fn with_map(tag: &str, body: &str) -> String {
    format!(
        "/*{tag}*/ (() => {{ {STORE} \
         const map = store.mapboxMapRef && store.mapboxMapRef.current; \
         if (!map) throw new Error('mapboxMapRef not ready'); \
         {body} }})()"
    )
}

fn with_scene(tag: &str, body: &str) -> String {
    format!(
        "/*{tag}*/ (() => {{ {STORE} \
         const three = store.threeStateRef && store.threeStateRef.current; \
         if (!three) throw new Error('threeStateRef not ready'); \
         {body} }})()"
    )
}

/// `[[west, south], [east, north]]`
pub fn bounds() -> String {
    with_map("bounds", "return map.getBounds().toArray();")
}

/// Whether the camera is still animating
pub fn animating() -> String {
    with_map("animating", "return map.isZooming() || map.isMoving();")
}

/// Canvas-local `{x, y}` of a location
pub fn project(at: LngLat) -> String {
    with_map(
        "project",
        &format!(
            "const p = map.project([{}, {}]); return {{ x: p.x, y: p.y }};",
            at.lng, at.lat
        ),
    )
}

/// Whether the viewport contains a location
pub fn contains(at: LngLat) -> String {
    with_map(
        "contains",
        &format!("return map.getBounds().contains([{}, {}]);", at.lng, at.lat),
    )
}

/// Number of interactive objects in the scene
pub fn rendered_count() -> String {
    with_scene("rendered-count", "return three.internal.interaction.length;")
}

/// Canvas-local positions of the editable vertex sprites
pub fn vertices() -> String {
    with_scene(
        "vertices",
        &format!(
            "const sprites = three.internal.interaction.filter(o => o.name === '{VERTEX_SPRITE_NAME}'); \
             const canvas = three.gl.domElement; \
             const halfW = canvas.clientWidth / 2; \
             const halfH = canvas.clientHeight / 2; \
             return sprites.map(sprite => {{ \
               const world = new THREE.Vector3(); \
               sprite.getWorldPosition(world); \
               const ndc = world.project(three.camera); \
               return {{ x: ndc.x * halfW + halfW, y: -ndc.y * halfH + halfH }}; \
             }});"
        ),
    )
}

/// Whether the scene-graph library is loaded
pub fn scene_library_present() -> String {
    "/*scene-library*/ typeof window.THREE !== 'undefined'".to_string()
}

/// Promise resolving once the scene-graph library has been injected
pub fn load_scene_library() -> String {
    format!(
        "/*load-scene-library*/ new Promise((resolve, reject) => {{ \
           const script = document.createElement('script'); \
           script.src = '{SCENE_LIBRARY_URL}'; \
           script.onload = () => resolve(true); \
           script.onerror = () => reject(new Error('failed to load {SCENE_LIBRARY_URL}')); \
           document.head.appendChild(script); \
         }})"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::script_tag;

    #[test]
    fn test_tags() {
        assert_eq!(script_tag(&bounds()), "bounds");
        assert_eq!(script_tag(&animating()), "animating");
        assert_eq!(script_tag(&project(LngLat::new(1.0, 2.0))), "project");
        assert_eq!(script_tag(&contains(LngLat::new(1.0, 2.0))), "contains");
        assert_eq!(script_tag(&rendered_count()), "rendered-count");
        assert_eq!(script_tag(&vertices()), "vertices");
        assert_eq!(script_tag(&scene_library_present()), "scene-library");
        assert_eq!(script_tag(&load_scene_library()), "load-scene-library");
    }

    #[test]
    fn test_project_uses_lng_lat_order() {
        let js = project(LngLat::new(-122.5, 37.25));
        assert!(js.contains("map.project([-122.5, 37.25])"));
    }

    #[test]
    fn test_vertices_filter_sprites() {
        let js = vertices();
        assert!(js.contains("EditableVertexSprite"));
        assert!(js.contains("clientWidth"));
        assert!(js.contains("threeStateRef"));
    }
}
