//! Instruction text for recolor edit requests

/// Build the edit instruction asking the service to recolor the shared object
///
/// The instruction pins the service to one prominent object common to every
/// input image, allows only that object's color to change, keeps background and
/// composition intact, and forbids adding new objects.
pub fn recolor_instruction(colour: &str) -> String {
    let colour = colour.trim();
    format!(
        "You receive a set of images that all show one common, prominent object. \
         Identify that object and change its color to {colour}.\n\
         \n\
         Rules:\n\
         - Recolor only the common object; every edited image must show it in {colour}.\n\
         - Leave the background, lighting, composition and every other object unchanged.\n\
         - Do not add, remove or reshape any object.\n\
         - Preserve the original style and overall feel of each image as closely as possible.\n\
         \n\
         The target color is {colour}. Accuracy of that color on the object matters most."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_embeds_colour() {
        let text = recolor_instruction("blue");
        assert!(text.matches("blue").count() >= 3);
        assert!(text.contains("common, prominent object"));
        assert!(text.contains("background"));
        assert!(text.contains("Do not add"));
    }

    #[test]
    fn test_instruction_trims_colour() {
        let text = recolor_instruction("  forest green \n");
        assert!(text.contains("to forest green."));
    }
}
