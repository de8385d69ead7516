use crate::models::{AdaptationRequest, Platform, TargetResolution};

pub const SYSTEM_INSTRUCTION: &str = "\
You are an expert AI art director.
Mission: recompose the supplied image for the target platform.
Rules:
1. Always state the exact aspect ratio and resolution parameters of the output.
2. When the change of aspect ratio is large (for example landscape to portrait), use \"Shift and Scale\": \
move the title, text and other salient foreground elements into the new safe area, scale the main subject up \
to fill the new width, and regenerate the background that connects them. Never simply extend the borders.
3. Reply with a single JSON object and nothing else, using exactly these keys: \
{\"platform\": \"...\", \"aspect_ratio\": \"...\", \"resolution_target\": \"...\", \"prompt\": \"...\"}. \
Do not add prose or wrap the JSON in code fences.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    pub system_instruction: String,
    pub user_instruction: String,
}

pub struct PromptComposer;

impl PromptComposer {
    pub fn compose(request: &AdaptationRequest) -> ComposedPrompt {
        let platform = request.target_platform;
        let mut user_instruction = format!("Target Platform: {}.", platform);

        let resolution = request
            .target_resolution()
            .filter(|_| platform.is_square());
        if let Some(resolution) = resolution {
            user_instruction.push_str(&format!(" Target Resolution: {}.", resolution));
        }

        if let Some(extra) = request
            .freeform_instruction
            .as_deref()
            .map(str::trim)
            .filter(|extra| !extra.is_empty())
        {
            user_instruction.push_str(&format!(" User Requirement: {}.", extra));
        }

        if let Some(guidance) = layout_guidance(platform, resolution) {
            user_instruction.push_str("\n\n");
            user_instruction.push_str(&guidance);
        }

        ComposedPrompt {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            user_instruction,
        }
    }
}

fn layout_guidance(platform: Platform, resolution: Option<TargetResolution>) -> Option<String> {
    match platform {
        Platform::TikTok => Some(
            "Re-layout for 9:16: separate the text layer from the main subject. \
Move the title into the top third and make it large and legible. \
Place the main subject in the lower two thirds and scale it up to fill the width. \
Regenerate the background behind moved elements so the result reads as a native vertical poster."
                .to_string(),
        ),
        Platform::AlbumCover => resolution.map(|resolution| {
            format!(
                "Album cover goal: {}px square. Keep maximum fidelity and crisp text suitable for \
music streaming platforms; upscale and denoise where needed.",
                resolution.pixels()
            )
        }),
        Platform::RedNote => Some(
            "Balance the composition vertically for 3:4 and keep a lifestyle aesthetic.".to_string(),
        ),
        Platform::Instagram | Platform::YouTube => None,
    }
}
