//! Per-channel colour histograms.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One colour channel of an RGBA raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Red,
    Green,
    Blue,
    Alpha,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Red, Channel::Green, Channel::Blue, Channel::Alpha];

    fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
            Channel::Alpha => 3,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
            Channel::Alpha => "alpha",
        };
        f.write_str(name)
    }
}

/// 256-bin counts for each of red, green, blue and alpha
///
/// Images without an alpha channel count every pixel as opaque (255).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    bins: [[u32; 256]; 4],
    pixels: u64,
}

impl Histogram {
    /// Count every pixel of `image` after conversion to 8-bit RGBA
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let mut bins = [[0u32; 256]; 4];
        for pixel in rgba.pixels() {
            for (channel, &value) in pixel.0.iter().enumerate() {
                bins[channel][value as usize] += 1;
            }
        }
        Self {
            bins,
            pixels: u64::from(rgba.width()) * u64::from(rgba.height()),
        }
    }

    pub fn bins(&self, channel: Channel) -> &[u32; 256] {
        &self.bins[channel.index()]
    }

    pub fn pixel_count(&self) -> u64 {
        self.pixels
    }

    /// Average 8-bit value of a channel, `None` for an empty image
    pub fn mean(&self, channel: Channel) -> Option<f64> {
        if self.pixels == 0 {
            return None;
        }
        let sum: u64 = self
            .bins(channel)
            .iter()
            .enumerate()
            .map(|(value, &count)| value as u64 * u64::from(count))
            .sum();
        Some(sum as f64 / self.pixels as f64)
    }

    /// Most frequent value of a channel; ties go to the darker value
    pub fn peak(&self, channel: Channel) -> Option<u8> {
        if self.pixels == 0 {
            return None;
        }
        let bins = self.bins(channel);
        let best = bins
            .iter()
            .enumerate()
            .fold(0, |best, (value, &count)| if count > bins[best] { value } else { best });
        u8::try_from(best).ok()
    }

    /// Per-channel summary for display and JSON output
    pub fn summary(&self) -> Vec<ChannelSummary> {
        Channel::ALL
            .iter()
            .filter_map(|&channel| {
                Some(ChannelSummary {
                    channel,
                    mean: self.mean(channel)?,
                    peak: self.peak(channel)?,
                })
            })
            .collect()
    }
}

/// Mean and peak of one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub channel: Channel,
    pub mean: f64,
    pub peak: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn counts_each_channel_separately() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        img.put_pixel(1, 1, Rgba([200, 20, 0, 128]));

        let histogram = Histogram::from_image(&DynamicImage::ImageRgba8(img));

        assert_eq!(histogram.pixel_count(), 4);
        assert_eq!(histogram.bins(Channel::Red)[10], 3);
        assert_eq!(histogram.bins(Channel::Red)[200], 1);
        assert_eq!(histogram.bins(Channel::Green)[20], 4);
        assert_eq!(histogram.bins(Channel::Blue)[0], 1);
        assert_eq!(histogram.bins(Channel::Alpha)[128], 1);
        for channel in Channel::ALL {
            assert_eq!(histogram.bins(channel).iter().sum::<u32>(), 4);
        }
    }

    #[test]
    fn opaque_images_fill_the_top_alpha_bin() {
        let img = RgbImage::from_pixel(3, 2, Rgb([1, 2, 3]));
        let histogram = Histogram::from_image(&DynamicImage::ImageRgb8(img));

        assert_eq!(histogram.bins(Channel::Alpha)[255], 6);
        assert_eq!(histogram.peak(Channel::Alpha), Some(255));
    }

    #[test]
    fn grey_images_spread_evenly_across_colour_channels() {
        let img = GrayImage::from_fn(4, 1, |x, _| Luma([(x * 50) as u8]));
        let histogram = Histogram::from_image(&DynamicImage::ImageLuma8(img));

        assert_eq!(histogram.bins(Channel::Red), histogram.bins(Channel::Green));
        assert_eq!(histogram.bins(Channel::Green), histogram.bins(Channel::Blue));
        assert_eq!(histogram.mean(Channel::Red), Some(75.0));
    }

    #[test]
    fn peak_prefers_darker_value_on_ties() {
        let img = RgbImage::from_fn(2, 1, |x, _| Rgb([if x == 0 { 90 } else { 40 }, 0, 0]));
        let histogram = Histogram::from_image(&DynamicImage::ImageRgb8(img));

        assert_eq!(histogram.peak(Channel::Red), Some(40));
        assert_eq!(histogram.mean(Channel::Red), Some(65.0));
    }

    #[test]
    fn empty_image_has_no_summary() {
        let histogram = Histogram::from_image(&DynamicImage::new_rgb8(0, 0));

        assert_eq!(histogram.pixel_count(), 0);
        assert_eq!(histogram.mean(Channel::Red), None);
        assert!(histogram.summary().is_empty());
    }
}
