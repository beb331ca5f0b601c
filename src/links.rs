//! Image link normalization.
//!
//! Converters that keep images in place (DOCX, PPTX) leave either inline
//! `data:image/...` payloads or links into their own media folder. Both are
//! rewritten to point at the caller's stored images.

use crate::insertion::MarkerFormatter;
use crate::model::ImageDescriptor;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;

lazy_static! {
    /// `![alt](target)`
    static ref RE_IMAGE_LINK: Regex = Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").unwrap();

    /// Media file name carrying the extraction number, e.g. `media/image3.png`
    static ref RE_MEDIA_NUMBER: Regex = Regex::new(r"image(\d+)").unwrap();
}

/// Rewrite existing Markdown image links to the stored images.
///
/// - `data:image` links take images in ascending sequence order, one each.
///   Once the images run out the remaining inline links are left as they are.
/// - Links whose target contains `image<N>` map to the image with
///   `sequence_index == N`.
/// - Every other link is left untouched.
///
/// Returns the rewritten text and the number of links replaced.
///
/// # Examples
///
/// ```
/// use figure_oxide::insertion::MarkdownImageMarker;
/// use figure_oxide::links::normalize_image_links;
/// use figure_oxide::model::ImageDescriptor;
///
/// let images = vec![ImageDescriptor::new(2, "images/doc/image_002.png")];
/// let (text, count) = normalize_image_links(
///     "Intro\n![](media/image2.emf)\n",
///     &images,
///     &MarkdownImageMarker::default(),
/// );
/// assert_eq!(text, "Intro\n![image](images/doc/image_002.png)\n");
/// assert_eq!(count, 1);
/// ```
pub fn normalize_image_links<F>(text: &str, images: &[ImageDescriptor], formatter: &F) -> (String, usize)
where
    F: MarkerFormatter + ?Sized,
{
    if images.is_empty() {
        return (text.to_string(), 0);
    }

    let mut ordered: Vec<&ImageDescriptor> = images.iter().collect();
    ordered.sort_by_key(|image| image.sequence_index);
    let by_sequence: HashMap<u32, &ImageDescriptor> =
        ordered.iter().map(|image| (image.sequence_index, *image)).collect();

    let mut next_inline = 0usize;
    let mut rewritten = 0usize;

    let result = RE_IMAGE_LINK.replace_all(text, |caps: &Captures| {
        let target = caps[2].trim();

        let image = if target.starts_with("data:image") {
            let image = ordered.get(next_inline).copied();
            next_inline += 1;
            image
        } else {
            RE_MEDIA_NUMBER
                .captures(target)
                .and_then(|m| m[1].parse::<u32>().ok())
                .and_then(|number| by_sequence.get(&number).copied())
        };

        match image {
            Some(image) => {
                rewritten += 1;
                log::debug!("Rewrote image link to {}", image.file_reference);
                formatter.format(image)
            },
            None => caps[0].to_string(),
        }
    });

    (result.into_owned(), rewritten)
}
