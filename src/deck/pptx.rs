//! Writer for the Office Open XML presentation package.
//!
//! The package holds one slide master with a single blank layout and a minimal theme. Every
//! slide uses that layout and carries its own text boxes and picture.

use super::{raster::RasterImage, Align, Rect, SlideDeck, TextBox, SLIDE_HEIGHT, SLIDE_WIDTH};
use crate::error::Result;
use std::{
    fmt::Write as _,
    io::{Seek, Write},
};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const REL_OFFICE_DOC: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_CORE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const REL_APP: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
const REL_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const CT_PRESENTATION: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const CT_MASTER: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const CT_LAYOUT: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
const CT_CORE: &str = "application/vnd.openxmlformats-package.core-properties+xml";
const CT_APP: &str = "application/vnd.openxmlformats-officedocument.extended-properties+xml";

/// Write `deck` as a presentation package. `rasters[i]` is the picture of slide `i`, if any.
pub fn write_package<W>(writer: W, deck: &SlideDeck, rasters: &[Option<RasterImage>]) -> Result<()>
where
    W: Write + Seek,
{
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let n_slides = deck.len();
    let put = |zip: &mut ZipWriter<W>, name: &str, body: &str| -> Result<()> {
        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())?;
        Ok(())
    };

    put(&mut zip, "[Content_Types].xml", &content_types(n_slides))?;
    put(
        &mut zip,
        "_rels/.rels",
        &relationships(&[
            (REL_OFFICE_DOC, "ppt/presentation.xml".to_owned()),
            (REL_CORE, "docProps/core.xml".to_owned()),
            (REL_APP, "docProps/app.xml".to_owned()),
        ]),
    )?;
    put(&mut zip, "docProps/core.xml", &core_properties(deck))?;
    put(&mut zip, "docProps/app.xml", &app_properties(n_slides))?;

    put(&mut zip, "ppt/presentation.xml", &presentation(n_slides))?;
    let mut pres_rels = vec![
        (REL_MASTER, "slideMasters/slideMaster1.xml".to_owned()),
        (REL_THEME, "theme/theme1.xml".to_owned()),
    ];
    pres_rels.extend((1..=n_slides).map(|i| (REL_SLIDE, format!("slides/slide{}.xml", i))));
    put(&mut zip, "ppt/_rels/presentation.xml.rels", &relationships(&pres_rels))?;

    put(&mut zip, "ppt/slideMasters/slideMaster1.xml", &slide_master())?;
    put(
        &mut zip,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        &relationships(&[
            (REL_LAYOUT, "../slideLayouts/slideLayout1.xml".to_owned()),
            (REL_THEME, "../theme/theme1.xml".to_owned()),
        ]),
    )?;
    put(&mut zip, "ppt/slideLayouts/slideLayout1.xml", &slide_layout())?;
    put(
        &mut zip,
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        &relationships(&[(REL_MASTER, "../slideMasters/slideMaster1.xml".to_owned())]),
    )?;
    put(&mut zip, "ppt/theme/theme1.xml", &theme())?;

    for (i, slide) in deck.slides().iter().enumerate() {
        let number = i + 1;
        let raster = rasters.get(i).and_then(Option::as_ref);

        let mut rels = vec![(REL_LAYOUT, "../slideLayouts/slideLayout1.xml".to_owned())];
        let mut shapes = String::new();
        let mut shape_id = 2;

        if let (Some(pic), Some(img)) = (slide.picture.as_ref(), raster) {
            let media = format!("ppt/media/image{}.png", number);
            zip.start_file(media.as_str(), stored)?;
            zip.write_all(&img.png)?;

            rels.push((REL_IMAGE, format!("../media/image{}.png", number)));
            shapes.push_str(&picture_shape(
                shape_id,
                "rId2",
                &pic.rect((img.width, img.height)),
            ));
            shape_id += 1;
        }

        for text in slide.text_boxes() {
            shapes.push_str(&text_shape(shape_id, &text));
            shape_id += 1;
        }

        put(
            &mut zip,
            &format!("ppt/slides/slide{}.xml", number),
            &slide_xml(&shapes),
        )?;
        put(
            &mut zip,
            &format!("ppt/slides/_rels/slide{}.xml.rels", number),
            &relationships(&rels),
        )?;
    }

    zip.finish()?;
    Ok(())
}

/// Escape text for XML content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn content_types(n_slides: usize) -> String {
    let mut xml = String::from(XML_HEADER);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Default Extension="png" ContentType="image/png"/>"#);

    let mut overrides = vec![
        ("/ppt/presentation.xml".to_owned(), CT_PRESENTATION),
        ("/ppt/slideMasters/slideMaster1.xml".to_owned(), CT_MASTER),
        ("/ppt/slideLayouts/slideLayout1.xml".to_owned(), CT_LAYOUT),
        ("/ppt/theme/theme1.xml".to_owned(), CT_THEME),
        ("/docProps/core.xml".to_owned(), CT_CORE),
        ("/docProps/app.xml".to_owned(), CT_APP),
    ];
    overrides.extend((1..=n_slides).map(|i| (format!("/ppt/slides/slide{}.xml", i), CT_SLIDE)));

    for (part, content_type) in overrides {
        let _ = write!(
            xml,
            r#"<Override PartName="{}" ContentType="{}"/>"#,
            part, content_type
        );
    }
    xml.push_str("</Types>");
    xml
}

fn relationships(targets: &[(&str, String)]) -> String {
    let mut xml = String::from(XML_HEADER);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (i, (kind, target)) in targets.iter().enumerate() {
        let _ = write!(
            xml,
            r#"<Relationship Id="rId{}" Type="{}" Target="{}"/>"#,
            i + 1,
            kind,
            escape(target)
        );
    }
    xml.push_str("</Relationships>");
    xml
}

fn core_properties(deck: &SlideDeck) -> String {
    format!(
        concat!(
            "{}",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<dc:title>{}</dc:title><dc:creator>{}</dc:creator>",
            "</cp:coreProperties>"
        ),
        XML_HEADER,
        escape(deck.title()),
        escape(deck.author())
    )
}

fn app_properties(n_slides: usize) -> String {
    format!(
        concat!(
            "{}",
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">"#,
            "<Application>{}</Application><Slides>{}</Slides></Properties>"
        ),
        XML_HEADER,
        env!("CARGO_PKG_NAME"),
        n_slides
    )
}

fn presentation(n_slides: usize) -> String {
    let mut xml = format!("{}<p:presentation {}>", XML_HEADER, NS);
    xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
    xml.push_str("<p:sldIdLst>");
    for i in 0..n_slides {
        // rId1 is the master and rId2 the theme
        let _ = write!(xml, r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 3);
    }
    xml.push_str("</p:sldIdLst>");
    let _ = write!(
        xml,
        r#"<p:sldSz cx="{}" cy="{}"/><p:notesSz cx="{}" cy="{}"/>"#,
        SLIDE_WIDTH.emu(),
        SLIDE_HEIGHT.emu(),
        SLIDE_HEIGHT.emu(),
        SLIDE_WIDTH.emu()
    );
    xml.push_str("</p:presentation>");
    xml
}

const EMPTY_TREE: &str = concat!(
    r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    "<p:grpSpPr/></p:spTree>"
);

fn slide_master() -> String {
    format!(
        concat!(
            "{}<p:sldMaster {}><p:cSld>{}</p:cSld>",
            r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" "#,
            r#"accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" "#,
            r#"folHlink="folHlink"/>"#,
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
            "</p:sldMaster>"
        ),
        XML_HEADER, NS, EMPTY_TREE
    )
}

fn slide_layout() -> String {
    format!(
        concat!(
            r#"{}<p:sldLayout {} type="blank" preserve="1"><p:cSld name="Blank">{}</p:cSld>"#,
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"
        ),
        XML_HEADER, NS, EMPTY_TREE
    )
}

fn theme() -> String {
    let mut xml = format!(
        r#"{}<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements>"#,
        XML_HEADER
    );

    xml.push_str(r#"<a:clrScheme name="Office">"#);
    xml.push_str(r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#);
    xml.push_str(r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#);
    for (name, rgb) in [
        ("dk2", "1F497D"),
        ("lt2", "EEECE1"),
        ("accent1", "4F81BD"),
        ("accent2", "C0504D"),
        ("accent3", "9BBB59"),
        ("accent4", "8064A2"),
        ("accent5", "4BACC6"),
        ("accent6", "F79646"),
        ("hlink", "0000FF"),
        ("folHlink", "800080"),
    ] {
        let _ = write!(xml, r#"<a:{0}><a:srgbClr val="{1}"/></a:{0}>"#, name, rgb);
    }
    xml.push_str("</a:clrScheme>");

    xml.push_str(concat!(
        r#"<a:fontScheme name="Office">"#,
        r#"<a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
        r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
        "</a:fontScheme>"
    ));

    let fill = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let line = r#"<a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#;
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";
    let _ = write!(
        xml,
        concat!(
            r#"<a:fmtScheme name="Office">"#,
            "<a:fillStyleLst>{0}{0}{0}</a:fillStyleLst>",
            "<a:lnStyleLst>{1}{1}{1}</a:lnStyleLst>",
            "<a:effectStyleLst>{2}{2}{2}</a:effectStyleLst>",
            "<a:bgFillStyleLst>{0}{0}{0}</a:bgFillStyleLst>",
            "</a:fmtScheme>"
        ),
        fill, line, effect
    );

    xml.push_str("</a:themeElements></a:theme>");
    xml
}

fn slide_xml(shapes: &str) -> String {
    format!(
        concat!(
            "{}<p:sld {}><p:cSld><p:spTree>",
            r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
            "<p:grpSpPr/>{}</p:spTree></p:cSld>",
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"
        ),
        XML_HEADER, NS, shapes
    )
}

fn xfrm(rect: &Rect) -> String {
    format!(
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        rect.left.emu(),
        rect.top.emu(),
        rect.width.emu(),
        rect.height.emu()
    )
}

fn picture_shape(id: usize, rel_id: &str, rect: &Rect) -> String {
    format!(
        concat!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="{0}" name="Picture {1}"/>"#,
            r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
            r#"<p:blipFill><a:blip r:embed="{2}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#,
            r#"<p:spPr>{3}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#
        ),
        id,
        id - 1,
        rel_id,
        xfrm(rect)
    )
}

fn text_shape(id: usize, text: &TextBox) -> String {
    let mut xml = format!(
        concat!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{0}" name="TextBox {1}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
            r#"<p:spPr>{2}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#,
            r#"<p:txBody><a:bodyPr wrap="none"><a:spAutoFit/></a:bodyPr><a:lstStyle/>"#
        ),
        id,
        id - 1,
        xfrm(&text.rect)
    );

    let mut paragraph_props = String::new();
    if text.align == Align::Center {
        paragraph_props.push_str(r#" algn="ctr""#);
    }
    let spacing = text
        .line_spacing
        .map(|s| {
            format!(
                r#"<a:lnSpc><a:spcPct val="{}"/></a:lnSpc>"#,
                (s * 100_000.0).round() as i64
            )
        })
        .unwrap_or_default();

    let mut run_props = format!(r#" lang="zh-CN" sz="{}""#, (text.size_pt * 100.0).round() as i64);
    if text.bold {
        run_props.push_str(r#" b="1""#);
    }
    let color = text
        .color
        .map(|(r, g, b)| {
            format!(
                r#"<a:solidFill><a:srgbClr val="{:02X}{:02X}{:02X}"/></a:solidFill>"#,
                r, g, b
            )
        })
        .unwrap_or_default();

    for line in text.text.split('\n') {
        let _ = write!(
            xml,
            r#"<a:p><a:pPr{}>{}</a:pPr><a:r><a:rPr{}>{}</a:rPr><a:t>{}</a:t></a:r></a:p>"#,
            paragraph_props,
            spacing,
            run_props,
            color,
            escape(line)
        );
    }

    xml.push_str("</p:txBody></p:sp>");
    xml
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::deck::{Picture, Slide};
    use std::io::{Cursor, Read};

    fn read_entry(archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut body = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut body)
            .unwrap();
        body
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("ACC & RMSE <1>"), "ACC &amp; RMSE &lt;1&gt;");
        assert_eq!(escape("Niño3.4"), "Niño3.4");
    }

    #[test]
    fn test_package_layout() {
        let mut deck = SlideDeck::new("ENSO").with_author("someone");
        deck.push(Slide {
            texts: vec![TextBox::new(Rect::new(1.0, 0.8, 8.0, 1.5), "line one\nline two", 40.0)
                .bold()
                .centered()
                .with_line_spacing(1.5)],
            ..Slide::default()
        });
        deck.push(Slide {
            title: Some("ACC & RMSE".to_owned()),
            picture: Some(Picture::centered("unused.svg", 8.0)),
            page_number: Some(1),
            ..Slide::default()
        });

        let rasters = vec![
            None,
            Some(RasterImage {
                png: b"\x89PNG fake".to_vec(),
                width: 800,
                height: 400,
            }),
        ];

        let mut buf = Cursor::new(Vec::new());
        write_package(&mut buf, &deck, &rasters).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(buf.into_inner())).unwrap();
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideLayouts/slideLayout1.xml",
            "ppt/theme/theme1.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/slide2.xml",
            "ppt/slides/_rels/slide2.xml.rels",
            "ppt/media/image2.png",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing {}", name);
        }
        assert!(archive.by_name("ppt/media/image1.png").is_err());

        let pres = read_entry(&mut archive, "ppt/presentation.xml");
        assert!(pres.contains(r#"<p:sldSz cx="9144000" cy="6858000"/>"#));
        assert_eq!(pres.matches("<p:sldId ").count(), 2);

        let title = read_entry(&mut archive, "ppt/slides/slide1.xml");
        assert_eq!(title.matches("<a:p>").count(), 2);
        assert!(title.contains(r#"algn="ctr""#));
        assert!(title.contains(r#"sz="4000" b="1""#));
        assert!(title.contains(r#"<a:spcPct val="150000"/>"#));

        let content = read_entry(&mut archive, "ppt/slides/slide2.xml");
        assert!(content.contains("ACC &amp; RMSE"));
        // 8 in wide centered on a 10 in slide, half as tall as wide
        assert!(content.contains(r#"<a:off x="914400" y="914400"/>"#));
        assert!(content.contains(r#"<a:ext cx="7315200" cy="3657600"/>"#));
    }
}
