use super::types::GenerationSettings;

const STYLE_TEMPLATE: &str = "Style: photorealistic architectural interior photography, \
soft natural daylight, warm neutral palette, premium materials, clean uncluttered staging, \
shot on a full-frame camera with a wide-angle lens, magazine-quality composition. \
No text, no watermarks, no people.";

pub fn build_prompt(title: &str, category: &str, settings: &GenerationSettings) -> String {
    let room = settings.room_type.trim();
    let mut prompt = format!(
        "A high-end interior design photograph of a {} featuring {} ({}) by a bespoke home furnishings studio.",
        if room.is_empty() { "home interior" } else { room },
        title.trim(),
        category.trim(),
    );
    let instructions = settings.instructions.trim();
    if !instructions.is_empty() {
        prompt.push_str(" Additional instructions: ");
        prompt.push_str(instructions);
        if !instructions.ends_with('.') {
            prompt.push('.');
        }
    }
    prompt.push(' ');
    prompt.push_str(STYLE_TEMPLATE);
    prompt
}
