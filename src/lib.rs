/*!
Minimalist map posters for any city.

plakat turns a place name into a stylized poster of its street network,
water and parks. The pipeline is strictly sequential: a [`GeoProvider`]
resolves coordinates and fetches vector geometry, the renderer draws it
into an owned [`Figure`] (water below parks below roads, with gradient
fades and typography on top), the page composer optionally maps the
figure onto a physical paper size with bleed and crop marks, and the
exporter writes PNG, PDF or EPS files.

# Example

```no_run
use plakat::osm::OsmProvider;
use plakat::render::RenderRequest;
use plakat::theme::ThemeStore;

fn main() -> plakat::Result<()> {
    let store = ThemeStore::open("themes");
    let provider = OsmProvider::new();
    let request = RenderRequest {
        city: "Frankfurt".into(),
        country: Some("Germany".into()),
        theme: "noir".into(),
        radius_m: 12000.0,
        dpi: 300,
    };

    let artifact = plakat::poster::create_poster(&provider, &store, &request, "posters")?;
    println!("{}", artifact.path.display());
    Ok(())
}
```

Every step is deterministic: rendering the same geometry with the same
theme and request twice produces byte-identical raster output and
structurally identical vector output.
*/

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod color;
pub mod error;
pub mod export;
pub mod geo;
pub mod geom;
pub mod osm;
pub mod page;
pub mod poster;
pub mod render;
pub mod text;
pub mod theme;

pub use color::Color;
pub use error::{Error, Result};
pub use export::{Artifact, Exporter, OutputFormat};
pub use geo::{GeoLayers, GeoProvider};
pub use page::{Orientation, PageSpec, PaperSize};
pub use render::{Figure, RenderRequest};
pub use theme::{Theme, ThemeStore};
