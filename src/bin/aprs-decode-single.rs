//! Decodes one APRS packet from the command line or stdin and prints
//! every populated field. Exits 0 on success, 1 on parse failure;
//! warnings are printed either way.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::process::ExitCode;

use aprs_fap::{Options, Packet, Telemetry, Weather};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let input = if args.is_empty() {
        let mut line = String::new();
        let mut stdin = std::io::stdin().lock();
        if stdin.read_line(&mut line).is_err() {
            eprintln!("read error");
            return ExitCode::FAILURE;
        }
        line
    } else {
        args.join(" ")
    };

    let input = input.trim();
    if input.is_empty() {
        eprintln!("Usage: aprs-decode-single <packet>");
        eprintln!("   or: echo '<packet>' | aprs-decode-single");
        return ExitCode::FAILURE;
    }

    let (packet, err) = Packet::decode(input.as_bytes(), &Options::default());

    let mut stdout = std::io::stdout().lock();
    let _ = print_packet(&mut stdout, &packet);

    if !packet.warnings.is_empty() {
        let _ = writeln!(stdout, "\nWarnings:");
        for w in &packet.warnings {
            let _ = writeln!(stdout, "  [{}] {}", w.code, w.detail);
        }
    }

    if let Some(err) = err {
        let _ = writeln!(stdout, "\nError: {}", err);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn text(b: &[u8]) -> String {
    String::from_utf8_lossy(b).into_owned()
}

fn print_packet<W: Write>(w: &mut W, p: &Packet) -> std::io::Result<()> {
    writeln!(w, "Original:     {}", text(&p.orig_packet))?;
    writeln!(w, "Header:       {}", text(&p.header))?;
    writeln!(w, "Body:         {}", text(&p.body))?;
    writeln!(w, "Source:       {}", p.src_callsign)?;
    writeln!(w, "Destination:  {}", p.dst_callsign)?;

    if !p.digipeaters.is_empty() {
        let digis: Vec<String> = p
            .digipeaters
            .iter()
            .map(|d| {
                if d.was_digied {
                    format!("{}*", d.call)
                } else {
                    d.call.clone()
                }
            })
            .collect();
        writeln!(w, "Digipeaters:  {}", digis.join(","))?;
    }

    if let Some(packet_type) = p.packet_type {
        writeln!(w, "Type:         {}", packet_type)?;
    }
    if let Some(format) = p.format {
        writeln!(w, "Format:       {}", format)?;
    }

    if let Some(latitude) = p.latitude {
        writeln!(w, "Latitude:     {:.6}", latitude)?;
    }
    if let Some(longitude) = p.longitude {
        writeln!(w, "Longitude:    {:.6}", longitude)?;
    }
    if let Some(ambiguity) = p.pos_ambiguity {
        writeln!(w, "PosAmbiguity: {}", ambiguity)?;
    }
    if let Some(resolution) = p.pos_resolution {
        writeln!(w, "PosResolution: {:.1} m", resolution)?;
    }

    if let Some(table) = p.symbol_table {
        writeln!(w, "SymbolTable:  {}", table)?;
    }
    if let Some(code) = p.symbol_code {
        writeln!(w, "SymbolCode:   {}", code)?;
    }

    if let Some(speed) = p.speed {
        writeln!(w, "Speed:        {:.1} km/h", speed)?;
    }
    if let Some(course) = p.course {
        writeln!(w, "Course:       {}°", course)?;
    }
    if let Some(altitude) = p.altitude {
        writeln!(w, "Altitude:     {:.1} m", altitude)?;
    }

    if let Some(messaging) = p.messaging {
        writeln!(w, "Messaging:    {}", messaging)?;
    }

    if let Some(phg) = &p.phg {
        writeln!(w, "PHG:          {}", phg)?;
    }
    if let Some(range) = p.radio_range {
        writeln!(w, "RadioRange:   {:.1} km", range)?;
    }

    if let Some(ts) = p.timestamp {
        writeln!(w, "Timestamp:    {}", ts.to_rfc3339())?;
    }
    if let Some(raw) = &p.raw_timestamp {
        writeln!(w, "RawTimestamp: {}", raw)?;
    }

    if let Some(name) = &p.object_name {
        writeln!(w, "ObjectName:   {}", name)?;
    }
    if let Some(name) = &p.item_name {
        writeln!(w, "ItemName:     {}", name)?;
    }
    if let Some(alive) = p.alive {
        writeln!(w, "Alive:        {}", alive)?;
    }

    if let Some(msg) = &p.message {
        writeln!(w, "Message:")?;
        writeln!(w, "  Destination: {}", msg.destination)?;
        if !msg.text.is_empty() {
            writeln!(w, "  Text:        {}", text(&msg.text))?;
        }
        if !msg.id.is_empty() {
            writeln!(w, "  ID:          {}", msg.id)?;
        }
        if !msg.ack_id.is_empty() {
            writeln!(w, "  AckID:       {}", msg.ack_id)?;
        }
        if !msg.rej_id.is_empty() {
            writeln!(w, "  RejID:       {}", msg.rej_id)?;
        }
    }

    if let Some(status) = &p.status {
        writeln!(w, "Status:       {}", text(status))?;
    }

    if let Some(wx) = &p.wx {
        print_weather(w, wx)?;
    }

    if let Some(telemetry) = &p.telemetry {
        print_telemetry(w, telemetry)?;
    }

    if let Some(capabilities) = &p.capabilities {
        print_capabilities(w, capabilities)?;
    }

    if let Some(mbits) = &p.mbits {
        writeln!(w, "MicE Bits:    {}", mbits)?;
    }
    if p.mice_mangled {
        writeln!(w, "MicE Mangled: true")?;
    }

    if let Some(datum) = p.dao_datum_byte {
        writeln!(w, "DAO Datum:    {}", datum)?;
    }

    if let Some(fix) = p.gps_fix_status {
        writeln!(w, "GPS Fix:      {}", fix)?;
    }
    if let Some(ok) = p.checksum_ok {
        writeln!(w, "Checksum OK:  {}", ok)?;
    }

    if !p.comment.is_empty() {
        writeln!(w, "Comment:      {}", text(&p.comment))?;
    }

    Ok(())
}

fn print_weather<W: Write>(w: &mut W, wx: &Weather) -> std::io::Result<()> {
    writeln!(w, "Weather:")?;
    if let Some(v) = wx.wind_direction {
        writeln!(w, "  Wind Dir:     {:.0}°", v)?;
    }
    if let Some(v) = wx.wind_speed {
        writeln!(w, "  Wind Speed:   {:.1} m/s", v)?;
    }
    if let Some(v) = wx.wind_gust {
        writeln!(w, "  Wind Gust:    {:.1} m/s", v)?;
    }
    if let Some(v) = wx.temp {
        writeln!(w, "  Temp:         {:.1} °C", v)?;
    }
    if let Some(v) = wx.temp_in {
        writeln!(w, "  Temp Indoor:  {:.1} °C", v)?;
    }
    if let Some(v) = wx.humidity {
        writeln!(w, "  Humidity:     {}%", v)?;
    }
    if let Some(v) = wx.humidity_in {
        writeln!(w, "  Humidity In:  {}%", v)?;
    }
    if let Some(v) = wx.pressure {
        writeln!(w, "  Pressure:     {:.1} mbar", v)?;
    }
    if let Some(v) = wx.rain_1h {
        writeln!(w, "  Rain 1h:      {:.1} mm", v)?;
    }
    if let Some(v) = wx.rain_24h {
        writeln!(w, "  Rain 24h:     {:.1} mm", v)?;
    }
    if let Some(v) = wx.rain_midnight {
        writeln!(w, "  Rain Today:   {:.1} mm", v)?;
    }
    if let Some(v) = wx.snow_24h {
        writeln!(w, "  Snow 24h:     {:.1} mm", v)?;
    }
    if let Some(v) = wx.luminosity {
        writeln!(w, "  Luminosity:   {} W/m²", v)?;
    }
    if let Some(v) = wx.water_level {
        writeln!(w, "  Water Level:  {:.2} m", v)?;
    }
    if let Some(v) = wx.radiation {
        writeln!(w, "  Radiation:    {:.1} nSv/h", v)?;
    }
    if let Some(v) = wx.battery_voltage {
        writeln!(w, "  Battery:      {:.1} V", v)?;
    }
    if let Some(software) = &wx.software {
        writeln!(w, "  Software:     {}", software)?;
    }
    Ok(())
}

fn print_telemetry<W: Write>(w: &mut W, t: &Telemetry) -> std::io::Result<()> {
    writeln!(w, "Telemetry:")?;
    if !t.seq.is_empty() {
        writeln!(w, "  Seq:    {}", t.seq)?;
    }
    for (i, val) in t.vals.iter().enumerate() {
        match val {
            Some(v) => writeln!(w, "  Val {}:  {:.2}", i + 1, v)?,
            None => writeln!(w, "  Val {}:  (undefined)", i + 1)?,
        }
    }
    if let Some(bits) = &t.bits {
        writeln!(w, "  Bits:   {}", bits)?;
    }
    Ok(())
}

fn print_capabilities<W: Write>(
    w: &mut W,
    capabilities: &BTreeMap<String, String>,
) -> std::io::Result<()> {
    writeln!(w, "Capabilities:")?;
    for (key, value) in capabilities {
        if value.is_empty() {
            writeln!(w, "  {}", key)?;
        } else {
            writeln!(w, "  {}={}", key, value)?;
        }
    }
    Ok(())
}
