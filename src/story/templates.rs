use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::story::types::Genre;

/// Marker replaced by the caller's prompt. Every template contains it once.
pub const PLACEHOLDER: &str = "{prompt}";

const ROMANCE: &str = "Rain had been falling over the harbor town since noon, and the lamps along the quay were already lit. {prompt}, and by the time the church bell struck six they were the last two people left in the little cafe by the water.

Their conversation drifted from the weather to the books on the shelf behind the counter, and then to the places they had always meant to visit. Neither of them noticed the owner stacking chairs around them.

When the rain finally eased, they walked the length of the pier together. She pointed out the boats she remembered from childhood, and he listened as if every name mattered, their shoulders brushing whenever the wind picked up.

At the end of the pier they stopped and watched the clouds break over the lighthouse. It was a small evening in a small town, but both of them knew it was the beginning of their story, and that the rest of it would be theirs to write.";

const FANTASY: &str = "In the mountain kingdom of Eldermere, where the rivers ran silver beneath twin moons, a new tale began: {prompt}.

The apprentice mage and the wandering knight met at the edge of the Whispering Wood. They had been sent by rival courts to recover the same relic, and neither trusted the other.

Their journey led them through caverns of glowing crystal and across bridges older than any kingdom. Each trial forced them to rely on one another, and their rivalry slowly turned into something warmer.

When at last they stood before the relic, they understood that its power answered only to two hearts in accord. Together they raised it, and the light pouring from their hands restored the fading heart of Eldermere.";

const SCI_FI: &str = "Aboard the research vessel Meridian, drifting at the edge of the Kuiper belt, {prompt}. The crew had grown used to silence, but that night the observation deck was anything but quiet.

The navigator and the xenobiologist had spent months avoiding each other on a ship barely large enough for twelve. Now they sat side by side beneath the dome, watching a comet unravel its tail across the dark.

Their instruments picked up a signal buried in the glow of the comet, a pattern too regular to be natural. They worked through the night decoding it, trading theories and cold coffee until the ship cycled its lights to morning.

By the time the captain arrived, the message was clear: an invitation, repeated in a hundred mathematical languages. The two of them exchanged a look that said they would answer it together, whatever their orders might be.";

const CONTEMPORARY: &str = "In the middle of a busy city, on the roof of an old textile mill turned into apartments, {prompt}. String lights swung gently above rows of tomato plants and mismatched chairs.

The neighbors had lived across the hall from each other for two years without exchanging more than a nod. Tonight a blackout had driven everyone upstairs, and they ended up sharing the last folding chair.

Their talk wandered from terrible landlords to favorite late-night diners, and somewhere along the way they realized they had been laughing for an hour. Below them the streets were dark, but for once the sky was full of stars.

When the power came back and the city lit up again, neither of them moved to leave. They stayed until sunrise, planning a garden for the roof and quietly deciding that the next blackout would not be needed to find their way back up here.";

const HISTORICAL: &str = "In the winter of 1812, within the candlelit halls of a manor on the Yorkshire moors, {prompt}. Snow had closed the roads, and the household settled in to wait out the storm.

The visiting cartographer and the daughter of the house met over a table of unfinished maps. They argued about coastlines and the courses of rivers, and each was surprised to find the other so well read.

Their evenings took on a rhythm of ink, firelight, and conversation, though propriety kept a chaperone always in the corner. Letters they were not meant to exchange passed between the pages of an atlas.

When the thaw came and the roads reopened, the cartographer had to leave for London. Yet the last map he drew in that house bore a small island with no name, and beside it, in her hand, a promise that their story was not finished.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub genre: Genre,
    pub text: &'static str,
}

impl Template {
    /// Substitutes the prompt into the template's placeholder.
    pub fn fill(&self, prompt: &str) -> String {
        self.text.replacen(PLACEHOLDER, prompt, 1)
    }
}

/// Static genre to template mapping. Built once and only ever read.
pub struct TemplateStore {
    templates: HashMap<&'static str, Template>,
}

static STORE: Lazy<TemplateStore> = Lazy::new(TemplateStore::builtin);

impl TemplateStore {
    pub fn global() -> &'static TemplateStore {
        &STORE
    }

    fn builtin() -> Self {
        let templates = Genre::ALL
            .into_iter()
            .map(|genre| {
                let text = match genre {
                    Genre::Romance => ROMANCE,
                    Genre::Fantasy => FANTASY,
                    Genre::SciFi => SCI_FI,
                    Genre::Contemporary => CONTEMPORARY,
                    Genre::Historical => HISTORICAL,
                };
                (genre.as_str(), Template { genre, text })
            })
            .collect();
        Self { templates }
    }

    /// Unknown genres get the romance template rather than an error.
    pub fn lookup(&self, genre: &str) -> Template {
        self.templates
            .get(genre)
            .or_else(|| self.templates.get(Genre::Romance.as_str()))
            .copied()
            .unwrap_or(Template {
                genre: Genre::Romance,
                text: ROMANCE,
            })
    }
}
